//! Enrich command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{github_client, open_harvest, print_summary, BatchFlags, GlobalOpts};
use crate::pipeline::enrich;

#[derive(Args, Debug, Clone, Default)]
pub struct EnrichArgs {
    /// Try again for repositories whose metadata failed in an earlier run
    #[arg(long)]
    pub retry_failed: bool,

    #[command(flatten)]
    pub batch: BatchFlags,
}

pub fn run(args: EnrichArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, args.batch.overrides())?;
    let client = github_client(&harvest.config)?;
    let summary = enrich::run(&harvest, &client, args.retry_failed)?;
    print_summary(&summary);
    Ok(())
}
