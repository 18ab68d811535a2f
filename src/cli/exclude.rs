//! Exclude command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{open_harvest, GlobalOpts};
use crate::config::CliOverrides;
use crate::domain::{ExclusionReason, RepoId};

#[derive(Args, Debug, Clone)]
pub struct ExcludeArgs {
    /// Repository as owner/name or URL
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// tutorial, no-tests, clone-failure or metadata-failure
    #[arg(short, long, value_name = "REASON")]
    pub reason: ExclusionReason,
}

pub fn run(args: ExcludeArgs, global: &GlobalOpts) -> Result<()> {
    let id: RepoId = args.repo.parse()?;
    let harvest = open_harvest(global, CliOverrides::default())?;
    let key = id.to_string();

    let dropped_record = harvest.records.remove(&id)?;
    let dropped_metadata = harvest.metadata.remove(&id)?;
    let dropped_listing = harvest.tests.remove(&key)?;
    let newly_excluded = harvest.exclusions.exclude(args.reason, &key)?;

    let clone_dir = harvest.layout.clone_dir(&id);
    if clone_dir.exists() {
        std::fs::remove_dir_all(&clone_dir)
            .with_context(|| format!("Failed to remove clone {}", clone_dir.display()))?;
    }

    tracing::info!(
        "Excluded {key} by hand ({}); record={dropped_record} metadata={dropped_metadata} listed={dropped_listing}",
        args.reason
    );
    if newly_excluded {
        println!("Excluded {key} ({})", args.reason);
    } else {
        let existing = harvest.exclusions.reason_for(&key)?.unwrap_or(args.reason);
        println!("{key} was already excluded ({existing})");
    }
    Ok(())
}
