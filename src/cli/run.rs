//! Run command implementation: the three core stages back to back.

use anyhow::Result;
use clap::Args;

use super::utils::{github_client, open_harvest, print_summary, BatchFlags, GlobalOpts};
use crate::config::CliOverrides;
use crate::fetch::GitFetcher;
use crate::pipeline::{acquire, discover, enrich};
use crate::qualify::Classifier;

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Search again even if the URL list already exists
    #[arg(long)]
    pub force: bool,

    /// Try again for repositories whose metadata failed in an earlier run
    #[arg(long)]
    pub retry_failed: bool,

    /// Repository language to search for
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<String>,

    /// Only repositories pushed after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub pushed_after: Option<String>,

    /// Abort a clone after this many seconds
    #[arg(long, value_name = "SECS")]
    pub clone_timeout: Option<u64>,

    #[command(flatten)]
    pub batch: BatchFlags,
}

impl RunArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            language: self.language.clone(),
            pushed_after: self.pushed_after.clone(),
            clone_timeout_secs: self.clone_timeout,
            ..self.batch.overrides()
        }
    }
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, args.overrides())?;
    let client = github_client(&harvest.config)?;
    let fetcher = GitFetcher::new(harvest.config.clone_timeout());
    let classifier = Classifier::from_config(&harvest.config.heuristics)?;

    // Each stage finishes before the next reads its output.
    let summaries = [
        discover::run(&harvest, &client, args.force)?,
        acquire::run(&harvest, &fetcher, &classifier)?,
        enrich::run(&harvest, &client, args.retry_failed)?,
    ];
    for summary in &summaries {
        print_summary(summary);
    }
    Ok(())
}
