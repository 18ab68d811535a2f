//! Enrichment: hosting-platform metadata for every accepted repository.

use super::{Harvest, StageSummary};
use crate::api::RepoApi;
use crate::domain::{ExclusionReason, RepoId};
use crate::error::HarvestError;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fetch metadata for each identifier in the tests-passing list that has no
/// full record yet.
///
/// Identifiers that exhausted their retries in an earlier run are skipped
/// unless `retry_failed` is set.
pub fn run(harvest: &Harvest, api: &dyn RepoApi, retry_failed: bool) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Enrichment");
    let ids = harvest.tests.read_required()?;
    summary.total = ids.len();

    let done = harvest.metadata.entries()?;
    let failures = harvest.exclusions.list(ExclusionReason::MetadataFailure);
    let previously_failed: HashSet<String> = failures.read()?.into_iter().collect();

    let mut work = Vec::new();
    for raw in ids {
        let id: RepoId = match raw.parse() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Skipping malformed identifier '{raw}': {e}");
                summary.failed += 1;
                continue;
            }
        };
        if done.contains_key(&raw) || (!retry_failed && previously_failed.contains(&raw)) {
            summary.skipped += 1;
            continue;
        }
        work.push(id);
    }

    harvest.failed_metadata.clear()?;
    let pending = work.len();
    println!("Fetching metadata for {pending} repositor{}", if pending == 1 { "y" } else { "ies" });
    if pending == 0 {
        return Ok(summary);
    }

    let done_count = AtomicUsize::new(0);
    let runner = harvest.batch_runner(harvest.config.enrich_concurrency)?;
    let report = runner.run(work, |id: &RepoId| {
        let result = enrich_one(harvest, api, id, retry_failed);
        let n = done_count.fetch_add(1, Ordering::SeqCst) + 1;
        match &result {
            Ok(()) => println!("[{n}] OK    {id}"),
            Err(e) if e.is_retryable() => println!("[{n}] RETRY {id}: {e}"),
            Err(e) => println!("[{n}] FAIL  {id}: {e}"),
        }
        result
    });

    let failed: Vec<String> = report.failed_items().map(RepoId::to_string).collect();
    if !failed.is_empty() {
        harvest.failed_metadata.write_all(&failed)?;
        for failure in &report.failed {
            tracing::warn!(
                "Metadata for {} failed after {} attempt(s): {}",
                failure.item,
                failure.attempts,
                failure.error
            );
            harvest.exclusions.exclude(ExclusionReason::MetadataFailure, &failure.item.to_string())?;
        }
        println!(
            "{} repositor{} failed; see {}",
            failed.len(),
            if failed.len() == 1 { "y" } else { "ies" },
            harvest.failed_metadata.path().display()
        );
    }

    summary.succeeded = report.succeeded.len();
    summary.failed += failed.len();
    Ok(summary)
}

fn enrich_one(
    harvest: &Harvest,
    api: &dyn RepoApi,
    id: &RepoId,
    retry_failed: bool,
) -> Result<(), HarvestError> {
    let mut record = api.repository(id)?.into_record();
    if let Some(partial) = harvest.records.get(id)? {
        record = record.with_counts_from(&partial);
    } else {
        tracing::debug!("{id} has no acquisition record; counts left empty");
    }
    harvest.metadata.upsert(id, record)?;

    if retry_failed {
        harvest.exclusions.list(ExclusionReason::MetadataFailure).remove(&id.to_string())?;
    }
    Ok(())
}
