//! Normalize command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{open_harvest, print_summary, GlobalOpts};
use crate::config::CliOverrides;
use crate::pipeline::normalize;

#[derive(Args, Debug, Clone, Default)]
pub struct NormalizeArgs {}

pub fn run(_args: NormalizeArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, CliOverrides::default())?;
    let summary = normalize::run(&harvest)?;
    print_summary(&summary);
    Ok(())
}
