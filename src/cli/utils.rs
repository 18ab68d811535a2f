//! Shared CLI utilities.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::api::GitHubClient;
use crate::config::{
    github_token, load_config, merge_cli_with_config, CliOverrides, DataLayout, HarvestConfig,
};
use crate::pipeline::{Harvest, StageSummary};

/// Flags every subcommand sees.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub data_dir: PathBuf,
    pub config: Option<PathBuf>,
}

/// Batch runner tuning shared by the network stages.
#[derive(Args, Debug, Clone, Default)]
pub struct BatchFlags {
    /// Items processed concurrently per wave
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Retry rounds for failed items
    #[arg(long, value_name = "N")]
    pub max_retries: Option<usize>,

    /// Seconds to wait before each retry round
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,
}

impl BatchFlags {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            concurrency: self.concurrency,
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay,
            ..Default::default()
        }
    }
}

pub fn load(global: &GlobalOpts, overrides: CliOverrides) -> Result<HarvestConfig> {
    let config = load_config(&global.data_dir, global.config.as_deref())?;
    Ok(merge_cli_with_config(config, overrides))
}

/// Load configuration and open every store under the data directory.
pub fn open_harvest(global: &GlobalOpts, overrides: CliOverrides) -> Result<Harvest> {
    let config = load(global, overrides)?;
    std::fs::create_dir_all(&global.data_dir).with_context(|| {
        format!("Failed to create data directory {}", global.data_dir.display())
    })?;
    Ok(Harvest::open(config, DataLayout::new(&global.data_dir)))
}

pub fn github_client(config: &HarvestConfig) -> Result<GitHubClient> {
    GitHubClient::new(
        &config.api_base,
        github_token(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    )
}

pub fn print_summary(summary: &StageSummary) {
    println!();
    println!("{summary}");
}
