//! Discover command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{github_client, open_harvest, print_summary, BatchFlags, GlobalOpts};
use crate::config::CliOverrides;
use crate::pipeline::discover;

#[derive(Args, Debug, Clone, Default)]
pub struct DiscoverArgs {
    /// Search again even if the URL list already exists
    #[arg(long)]
    pub force: bool,

    /// Repository language to search for
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<String>,

    /// Only repositories pushed after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub pushed_after: Option<String>,

    #[command(flatten)]
    pub batch: BatchFlags,
}

impl DiscoverArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            language: self.language.clone(),
            pushed_after: self.pushed_after.clone(),
            ..self.batch.overrides()
        }
    }
}

pub fn run(args: DiscoverArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, args.overrides())?;
    let client = github_client(&harvest.config)?;
    let summary = discover::run(&harvest, &client, args.force)?;
    print_summary(&summary);
    Ok(())
}
