//! Acquisition: clone every discovered repository and qualify it.
//!
//! Accepted repositories get a partial record and a line in the
//! tests-passing list, and keep their clone for extraction. Rejected and
//! failed ones land in exactly one exclusion list and lose their clone.

use super::{Harvest, StageSummary};
use crate::domain::{ExclusionReason, RepoId, RepoRecord, Verdict};
use crate::error::HarvestError;
use crate::fetch::{Checkout, Fetcher};
use crate::qualify::Classifier;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Running counters shared by the workers of one acquisition run.
#[derive(Default)]
struct Progress {
    done: AtomicUsize,
    accepted: AtomicUsize,
    excluded: AtomicUsize,
    failed: AtomicUsize,
}

impl Progress {
    fn report(&self, total: usize, verdict: &str, id: &RepoId, detail: &str) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        println!(
            "[{done}/{total}] {verdict:<6} {id} {detail} (accepted={} excluded={} failed={})",
            self.accepted.load(Ordering::SeqCst),
            self.excluded.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
        );
    }
}

pub fn run(harvest: &Harvest, fetcher: &dyn Fetcher, classifier: &Classifier) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Acquisition");
    let urls = harvest.urls.read_required()?;
    summary.total = urls.len();

    let recorded = harvest.records.entries()?;
    let mut excluded = HashSet::new();
    for reason in ExclusionReason::ALL {
        excluded.extend(harvest.exclusions.list(reason).read()?);
    }

    let mut seen = HashSet::new();
    let mut work = Vec::new();
    for url in urls {
        let id = match RepoId::from_url(&url) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Skipping unparseable URL {url}: {e}");
                summary.failed += 1;
                continue;
            }
        };
        let key = id.to_string();
        if !seen.insert(key.clone()) {
            summary.skipped += 1;
            continue;
        }
        if recorded.contains_key(&key) {
            // Repairs a tests list that lost the line after the record was written.
            harvest.tests.append(&key)?;
            summary.skipped += 1;
            continue;
        }
        if excluded.contains(&key) {
            summary.skipped += 1;
            continue;
        }
        work.push((id, url));
    }

    let pending = work.len();
    println!(
        "Acquiring {pending} repositor{} ({} already handled)",
        if pending == 1 { "y" } else { "ies" },
        summary.skipped
    );
    if pending == 0 {
        return Ok(summary);
    }

    let progress = Progress::default();
    let runner = harvest.batch_runner(harvest.config.acquire_concurrency)?;
    let report = runner.run(work, |(id, url): &(RepoId, String)| {
        acquire_one(harvest, fetcher, classifier, id, url, pending, &progress)
    });

    for failure in &report.failed {
        tracing::warn!("Acquisition of {} failed: {}", failure.item.0, failure.error);
    }

    summary.succeeded = progress.accepted.load(Ordering::SeqCst);
    summary.excluded = progress.excluded.load(Ordering::SeqCst);
    summary.failed += report.failed.len();
    Ok(summary)
}

fn acquire_one(
    harvest: &Harvest,
    fetcher: &dyn Fetcher,
    classifier: &Classifier,
    id: &RepoId,
    url: &str,
    total: usize,
    progress: &Progress,
) -> Result<(), HarvestError> {
    let checkout = Checkout::new(harvest.layout.clone_dir(id));

    if let Err(err) = fetcher.fetch(url, checkout.path()) {
        return clone_failed(harvest, id, err, total, progress);
    }

    let verdict = match classifier.classify(checkout.path()) {
        Ok(verdict) => verdict,
        Err(e) => {
            let err = HarvestError::Clone { url: url.to_string(), message: format!("{e:#}") };
            return clone_failed(harvest, id, err, total, progress);
        }
    };

    match verdict {
        Verdict::Accept(qualification) => {
            let record = RepoRecord::from_qualification(id, url, &qualification);
            harvest.records.upsert(id, record)?;
            harvest.tests.append(&id.to_string())?;
            checkout.keep();

            progress.accepted.fetch_add(1, Ordering::SeqCst);
            let frameworks: Vec<String> = qualification
                .framework_files
                .iter()
                .map(|(name, count)| format!("{name}={count}"))
                .collect();
            progress.report(
                total,
                "ACCEPT",
                id,
                &format!("tests={} {}", qualification.test_files, frameworks.join(" ")),
            );
            tracing::info!("Accepted {id}");
        }
        Verdict::Reject(reason) => {
            harvest.exclusions.exclude(reason, &id.to_string())?;
            progress.excluded.fetch_add(1, Ordering::SeqCst);
            progress.report(total, "REJECT", id, reason.as_str());
            tracing::info!("Excluded {id}: {reason}");
        }
    }
    Ok(())
}

/// Record a clone failure and hand the terminal error back to the runner.
fn clone_failed(
    harvest: &Harvest,
    id: &RepoId,
    err: HarvestError,
    total: usize,
    progress: &Progress,
) -> Result<(), HarvestError> {
    harvest.exclusions.exclude(ExclusionReason::CloneFailure, &id.to_string())?;
    progress.failed.fetch_add(1, Ordering::SeqCst);
    progress.report(total, "FAIL", id, &err.to_string());
    Err(err)
}
