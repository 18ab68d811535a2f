//! Extraction: test functions from the kept clones into the dataset.

use super::{Harvest, StageSummary};
use crate::dataset::{extract_tests, DatasetEntry};
use crate::store::write_atomic;
use crate::utils::read_file_safe;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoStatus {
    Processed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Per-repository line of the extraction report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoExtraction {
    pub status: RepoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub test_files_count: usize,
    pub test_functions_count: usize,
    pub processed_files: usize,
    #[serde(default)]
    pub failed_files_count: usize,
    pub failed_files: Vec<FileFailure>,
}

impl RepoExtraction {
    fn skipped(reason: &str) -> Self {
        Self {
            status: RepoStatus::Skipped,
            error: Some(reason.to_string()),
            test_files_count: 0,
            test_functions_count: 0,
            processed_files: 0,
            failed_files_count: 0,
            failed_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub timestamp: String,
    pub total_repositories: usize,
    pub successful_repositories: usize,
    pub total_test_files_found: usize,
    pub total_test_functions_found: usize,
    pub repositories: BTreeMap<String, RepoExtraction>,
}

/// Python files whose name or relative directory mentions `test`.
fn candidate_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            let lowered = relative.to_string_lossy().to_lowercase();
            lowered.ends_with(".py") && lowered.contains("test")
        })
        .collect();
    files.sort();
    files
}

/// Extract every test in one checkout.
pub fn extract_repo(repo: &str, root: &Path) -> (RepoExtraction, Vec<DatasetEntry>) {
    if !root.is_dir() {
        return (RepoExtraction::skipped("Directory not found"), Vec::new());
    }

    let mut summary = RepoExtraction {
        status: RepoStatus::Processed,
        error: None,
        test_files_count: 0,
        test_functions_count: 0,
        processed_files: 0,
        failed_files_count: 0,
        failed_files: Vec::new(),
    };
    let mut entries = Vec::new();

    for path in candidate_files(root) {
        summary.processed_files += 1;
        let relative = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");

        let content = match read_file_safe(&path) {
            Ok(content) => content,
            Err(e) => {
                summary.failed_files.push(FileFailure { file: relative, error: format!("{e:#}") });
                continue;
            }
        };
        if !content.to_lowercase().contains("test") {
            continue;
        }

        match extract_tests(&content, &relative) {
            Ok(tests) if tests.is_empty() => {}
            Ok(tests) => {
                summary.test_files_count += 1;
                summary.test_functions_count += tests.len();
                entries.push(DatasetEntry { repo: repo.to_string(), file: relative, tests });
            }
            Err(e) => {
                tracing::debug!("{repo}: {relative}: {e:#}");
                summary.failed_files.push(FileFailure { file: relative, error: format!("{e:#}") });
            }
        }
    }

    summary.failed_files_count = summary.failed_files.len();
    (summary, entries)
}

pub fn run(harvest: &Harvest) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Extraction");
    let repos = harvest.tests.read_required()?;
    summary.total = repos.len();
    println!("Extracting tests from {} repositories", repos.len());

    let results: Vec<(String, RepoExtraction, Vec<DatasetEntry>)> = repos
        .par_iter()
        .map(|repo| {
            let root = match repo.parse() {
                Ok(id) => harvest.layout.clone_dir(&id),
                Err(_) => PathBuf::new(),
            };
            let (extraction, entries) = extract_repo(repo, &root);
            (repo.clone(), extraction, entries)
        })
        .collect();

    let mut report = ExtractionReport {
        timestamp: chrono::Local::now().to_rfc3339(),
        total_repositories: repos.len(),
        successful_repositories: 0,
        total_test_files_found: 0,
        total_test_functions_found: 0,
        repositories: BTreeMap::new(),
    };
    let mut dataset = Vec::new();

    for (i, (repo, extraction, entries)) in results.into_iter().enumerate() {
        println!(
            "[{}/{}] {repo}: {} test files, {} test functions",
            i + 1,
            repos.len(),
            extraction.test_files_count,
            extraction.test_functions_count
        );
        match extraction.status {
            RepoStatus::Skipped => summary.skipped += 1,
            RepoStatus::Processed if extraction.test_files_count > 0 => {
                summary.succeeded += 1;
                report.successful_repositories += 1;
                report.total_test_files_found += extraction.test_files_count;
                report.total_test_functions_found += extraction.test_functions_count;
            }
            RepoStatus::Processed => summary.excluded += 1,
        }
        report.repositories.insert(repo, extraction);
        dataset.extend(entries);
    }

    let dataset_json = serde_json::to_vec_pretty(&dataset).context("Failed to serialize dataset")?;
    write_atomic(&harvest.layout.tests_dataset(), &dataset_json)?;
    let report_json = serde_json::to_vec_pretty(&report).context("Failed to serialize report")?;
    write_atomic(&harvest.layout.extraction_report(), &report_json)?;

    println!(
        "Extracted {} test functions from {} files to {}",
        report.total_test_functions_found,
        dataset.len(),
        harvest.layout.tests_dataset().display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn extracts_from_test_paths_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "tests/test_core.py", "def test_core():\n    assert True\n");
        write(root, "src/core.py", "def test_not_collected():\n    pass\n");
        write(root, "src/core_test.py", "def test_helper():\n    pass\n");
        write(root, ".git/test_hook.py", "def test_hidden():\n    pass\n");

        let (summary, entries) = extract_repo("o/r", root);
        assert_eq!(summary.status, RepoStatus::Processed);
        assert_eq!(summary.processed_files, 2);
        assert_eq!(summary.test_functions_count, 2);
        let files: Vec<_> = entries.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["src/core_test.py", "tests/test_core.py"]);
    }

    #[test]
    fn parse_failures_are_recorded_per_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "tests/test_bad.py", "def test_bad(:\n");
        write(tmp.path(), "tests/test_ok.py", "def test_ok():\n    pass\n");

        let (summary, entries) = extract_repo("o/r", tmp.path());
        assert_eq!(summary.failed_files.len(), 1);
        assert_eq!(summary.failed_files_count, 1);
        assert_eq!(summary.failed_files[0].file, "tests/test_bad.py");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_checkout_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let (summary, entries) = extract_repo("o/r", &tmp.path().join("absent"));
        assert_eq!(summary.status, RepoStatus::Skipped);
        assert!(entries.is_empty());
    }
}
