//! Discovery: search results → deduplicated clone URL list.
//!
//! The search API stops returning results after a fixed count, so the query
//! is split into star buckets and each bucket is paginated separately.

use super::{Harvest, StageSummary};
use crate::api::{search_query, RepoApi};
use crate::error::HarvestError;
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// Every clone URL for one star range, across all pages.
pub fn search_range(
    api: &dyn RepoApi,
    query: &str,
    per_page: u32,
    max_results: u32,
) -> Result<Vec<String>, HarvestError> {
    let per_page = per_page.clamp(1, 100);
    let mut urls = Vec::new();
    let mut page = 1u32;

    loop {
        let result = api.search_repositories(query, page, per_page)?;
        if result.incomplete_results {
            tracing::warn!("Search for '{query}' page {page} timed out upstream; results are partial");
        }
        let received = result.items.len();
        urls.extend(result.items.into_iter().map(|item| item.clone_url));

        let reachable = result.total_count.min(u64::from(max_results));
        let fetched = u64::from(page) * u64::from(per_page);
        if received < per_page as usize || fetched >= reachable {
            if result.total_count > u64::from(max_results) {
                tracing::warn!(
                    "'{query}' matches {} repositories; only the first {max_results} are reachable",
                    result.total_count
                );
            }
            break;
        }
        page += 1;
    }

    Ok(urls)
}

/// Search every star range, or only the ranges that failed last time.
///
/// A non-empty URL list with no recorded range failures counts as done.
/// When ranges failed, the next run re-queries just those and merges the
/// results into the existing list. `force` searches every range afresh.
pub fn run(harvest: &Harvest, api: &dyn RepoApi, force: bool) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Discovery");
    let config = &harvest.config;

    let existing = harvest.urls.read()?;
    let pending = harvest.failed_ranges.read()?;
    let resuming = !force && !existing.is_empty();
    if resuming && pending.is_empty() {
        println!(
            "URL list {} already has {} entries; skipping discovery (use --force to redo)",
            harvest.urls.path().display(),
            existing.len()
        );
        summary.total = existing.len();
        summary.skipped = existing.len();
        return Ok(summary);
    }

    let pushed_after = config.pushed_after();
    let (ranges, seed) = if resuming {
        println!("Re-querying {} star range(s) that failed last run", pending.len());
        (pending, existing)
    } else {
        (config.valid_star_ranges(), Vec::new())
    };
    summary.total = ranges.len();
    tracing::info!("Discovery over {} star range(s), pushed after {}", ranges.len(), pushed_after);

    let collected: Mutex<BTreeSet<String>> = Mutex::new(seed.into_iter().collect());
    let runner = harvest.batch_runner(1)?;
    let report = runner.run(ranges, |range: &String| {
        let query = search_query(&config.language, range, &pushed_after);
        let urls = search_range(api, &query, config.per_page, config.max_results)?;
        let mut all = collected.lock().unwrap_or_else(PoisonError::into_inner);
        let before = all.len();
        all.extend(urls.iter().cloned());
        println!(
            "  stars:{range}: {} result(s), {} new, {} unique so far",
            urls.len(),
            all.len() - before,
            all.len()
        );
        Ok::<(), HarvestError>(())
    });

    for failure in &report.failed {
        println!("  stars:{}: FAILED after {} attempt(s): {}", failure.item, failure.attempts, failure.error);
        tracing::warn!("Star range {} failed: {}", failure.item, failure.error);
    }

    let urls: Vec<String> = collected.into_inner().unwrap_or_else(PoisonError::into_inner).into_iter().collect();
    harvest.urls.write_all(&urls)?;
    tracing::info!("Wrote {} URL(s) to {}", urls.len(), harvest.urls.path().display());

    let still_failing: Vec<&String> = report.failed_items().collect();
    if still_failing.is_empty() {
        harvest.failed_ranges.clear()?;
    } else {
        harvest.failed_ranges.write_all(&still_failing)?;
        println!(
            "{} star range(s) failed; the next run re-queries them ({})",
            still_failing.len(),
            harvest.failed_ranges.path().display()
        );
    }

    summary.succeeded = report.succeeded.len();
    summary.failed = report.failed.len();
    println!("Collected {} unique repository URL(s)", urls.len());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RepoMetadata, SearchItem, SearchPage};
    use crate::domain::RepoId;

    struct PagedApi {
        total: u64,
    }

    impl RepoApi for PagedApi {
        fn search_repositories(
            &self,
            _query: &str,
            page: u32,
            per_page: u32,
        ) -> crate::Result<SearchPage> {
            let start = u64::from(page - 1) * u64::from(per_page);
            let end = (start + u64::from(per_page)).min(self.total);
            let items = (start..end)
                .map(|i| SearchItem {
                    full_name: format!("o/r{i}"),
                    clone_url: format!("https://github.com/o/r{i}.git"),
                })
                .collect();
            Ok(SearchPage { total_count: self.total, incomplete_results: false, items })
        }

        fn repository(&self, id: &RepoId) -> crate::Result<RepoMetadata> {
            Err(HarvestError::Gone { target: id.to_string(), status: 404 })
        }
    }

    #[test]
    fn paginates_until_short_page() {
        let urls = search_range(&PagedApi { total: 250 }, "q", 100, 1000).unwrap();
        assert_eq!(urls.len(), 250);
    }

    #[test]
    fn stops_at_exact_page_boundary() {
        let urls = search_range(&PagedApi { total: 200 }, "q", 100, 1000).unwrap();
        assert_eq!(urls.len(), 200);
    }

    #[test]
    fn respects_result_ceiling() {
        let urls = search_range(&PagedApi { total: 5000 }, "q", 100, 1000).unwrap();
        assert_eq!(urls.len(), 1000);
    }
}
