//! Deduplication: drop tests whose body was already seen.

use super::{Harvest, StageSummary};
use crate::dataset::DatasetEntry;
use crate::error::HarvestError;
use crate::store::write_atomic;
use crate::utils::content_hash;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const TOP_REPOS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDuplicates {
    pub repo: String,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    pub original_entries: usize,
    pub original_tests: usize,
    pub unique_entries: usize,
    pub unique_tests: usize,
    pub duplicate_entries: usize,
    pub duplicate_tests: usize,
    pub repositories_with_duplicates: usize,
    pub top_duplicate_repos: Vec<RepoDuplicates>,
}

/// Keep the first occurrence of every test body, in dataset order.
///
/// Entries keep only their unique tests, entries left empty are dropped,
/// and each `repo:file` appears at most once.
pub fn deduplicate(dataset: Vec<DatasetEntry>) -> (Vec<DatasetEntry>, DedupStats) {
    let mut stats = DedupStats {
        original_entries: dataset.len(),
        original_tests: dataset.iter().map(|e| e.tests.len()).sum(),
        ..Default::default()
    };

    let mut seen_bodies = HashSet::new();
    let mut seen_files = HashSet::new();
    let mut per_repo: BTreeMap<String, usize> = BTreeMap::new();
    let mut deduped = Vec::new();

    for mut entry in dataset {
        let before = entry.tests.len();
        entry.tests.retain(|test| seen_bodies.insert(content_hash(&test.body)));
        let dropped = before - entry.tests.len();
        if dropped > 0 {
            *per_repo.entry(entry.repo.clone()).or_insert(0) += dropped;
        }
        stats.unique_tests += entry.tests.len();

        if !entry.tests.is_empty() && seen_files.insert(entry.key()) {
            deduped.push(entry);
        }
    }

    stats.unique_entries = deduped.len();
    stats.duplicate_entries = stats.original_entries - stats.unique_entries;
    stats.duplicate_tests = stats.original_tests - stats.unique_tests;
    stats.repositories_with_duplicates = per_repo.len();

    let mut ranked: Vec<(String, usize)> = per_repo.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    stats.top_duplicate_repos = ranked
        .into_iter()
        .take(TOP_REPOS)
        .map(|(repo, duplicates)| RepoDuplicates { repo, duplicates })
        .collect();

    (deduped, stats)
}

pub fn run(harvest: &Harvest) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Deduplication");
    let input = harvest.layout.tests_dataset();
    if !input.is_file() {
        return Err(HarvestError::MissingInput(input).into());
    }

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let dataset: Vec<DatasetEntry> = serde_json::from_str(&content)
        .map_err(|source| HarvestError::CorruptDocument { path: input.clone(), source })?;
    let repos: HashSet<&str> = dataset.iter().map(|e| e.repo.as_str()).collect();
    println!("Loaded {} entries from {} repositories", dataset.len(), repos.len());

    let (deduped, stats) = deduplicate(dataset);

    let deduped_json = serde_json::to_vec_pretty(&deduped).context("Failed to serialize dataset")?;
    write_atomic(&harvest.layout.deduped_dataset(), &deduped_json)?;
    let stats_json = serde_json::to_vec_pretty(&stats).context("Failed to serialize statistics")?;
    write_atomic(&harvest.layout.dedup_report(), &stats_json)?;

    let share = if stats.original_tests > 0 {
        stats.duplicate_tests as f64 / stats.original_tests as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "Kept {} of {} tests ({} duplicates, {share:.1}%)",
        stats.unique_tests, stats.original_tests, stats.duplicate_tests
    );
    for top in stats.top_duplicate_repos.iter().take(5) {
        println!("  {}: {} duplicates", top.repo, top.duplicates);
    }

    summary.total = stats.original_tests;
    summary.succeeded = stats.unique_tests;
    summary.excluded = stats.duplicate_tests;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TestCase;

    fn test(name: &str, body: &str) -> TestCase {
        TestCase { name: name.into(), body: body.into(), file: "t.py".into(), class: None }
    }

    fn entry(repo: &str, file: &str, tests: Vec<TestCase>) -> DatasetEntry {
        DatasetEntry { repo: repo.into(), file: file.into(), tests }
    }

    #[test]
    fn first_occurrence_wins_and_duplicates_are_counted() {
        let dataset = vec![
            entry("a/x", "test_a.py", vec![test("test_1", "def test_1(): pass"), test("test_2", "def test_2(): pass")]),
            entry("b/y", "test_b.py", vec![test("test_1", "def test_1(): pass")]),
            entry("b/y", "test_c.py", vec![test("test_3", "def test_3(): pass"), test("test_2", "def test_2(): pass")]),
        ];

        let (deduped, stats) = deduplicate(dataset);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].tests.len(), 2);
        assert_eq!(deduped[1].file, "test_c.py");
        assert_eq!(deduped[1].tests.len(), 1);
        assert_eq!(stats.original_tests, 5);
        assert_eq!(stats.unique_tests, 3);
        assert_eq!(stats.duplicate_tests, 2);
        assert_eq!(stats.duplicate_entries, 1);
        assert_eq!(stats.repositories_with_duplicates, 1);
        assert_eq!(stats.top_duplicate_repos, vec![RepoDuplicates { repo: "b/y".into(), duplicates: 2 }]);
    }

    #[test]
    fn repeated_file_entries_are_kept_once() {
        let dataset = vec![
            entry("a/x", "test_a.py", vec![test("test_1", "one")]),
            entry("a/x", "test_a.py", vec![test("test_2", "two")]),
        ];
        let (deduped, stats) = deduplicate(dataset);
        assert_eq!(deduped.len(), 1);
        assert_eq!(stats.unique_entries, 1);
    }

    #[test]
    fn empty_dataset() {
        let (deduped, stats) = deduplicate(Vec::new());
        assert!(deduped.is_empty());
        assert_eq!(stats, DedupStats::default());
    }
}
