//! Acquire command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{open_harvest, print_summary, BatchFlags, GlobalOpts};
use crate::config::CliOverrides;
use crate::fetch::GitFetcher;
use crate::pipeline::acquire;
use crate::qualify::Classifier;

#[derive(Args, Debug, Clone, Default)]
pub struct AcquireArgs {
    /// Abort a clone after this many seconds
    #[arg(long, value_name = "SECS")]
    pub clone_timeout: Option<u64>,

    #[command(flatten)]
    pub batch: BatchFlags,
}

impl AcquireArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides { clone_timeout_secs: self.clone_timeout, ..self.batch.overrides() }
    }
}

pub fn run(args: AcquireArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, args.overrides())?;
    let fetcher = GitFetcher::new(harvest.config.clone_timeout());
    let classifier = Classifier::from_config(&harvest.config.heuristics)?;
    let summary = acquire::run(&harvest, &fetcher, &classifier)?;
    print_summary(&summary);
    Ok(())
}
