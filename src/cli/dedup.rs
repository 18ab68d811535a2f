//! Dedup command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{open_harvest, print_summary, GlobalOpts};
use crate::config::CliOverrides;
use crate::pipeline::dedup;

#[derive(Args, Debug, Clone, Default)]
pub struct DedupArgs {}

pub fn run(_args: DedupArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, CliOverrides::default())?;
    let summary = dedup::run(&harvest)?;
    print_summary(&summary);
    Ok(())
}
