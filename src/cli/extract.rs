//! Extract command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{open_harvest, print_summary, GlobalOpts};
use crate::config::CliOverrides;
use crate::pipeline::extract;

#[derive(Args, Debug, Clone, Default)]
pub struct ExtractArgs {
    /// Worker threads (defaults to the number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,
}

pub fn run(args: ExtractArgs, global: &GlobalOpts) -> Result<()> {
    let harvest = open_harvest(global, CliOverrides::default())?;
    let summary = match args.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()?
            .install(|| extract::run(&harvest))?,
        None => extract::run(&harvest)?,
    };
    print_summary(&summary);
    Ok(())
}
