//! File layout of a harvest data directory.

use crate::domain::{ExclusionReason, RepoId};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Newline-delimited clone URLs produced by discovery.
    pub fn url_list(&self) -> PathBuf {
        self.root.join("repo_urls.txt")
    }

    /// Star ranges whose search failed in the last discovery run.
    pub fn failed_star_ranges(&self) -> PathBuf {
        self.root.join("failed_star_ranges.txt")
    }

    /// Identifiers accepted by acquisition.
    pub fn tests_list(&self) -> PathBuf {
        self.root.join("repos_with_tests.txt")
    }

    pub fn exclusion_list(&self, reason: ExclusionReason) -> PathBuf {
        self.root.join(reason.file_name())
    }

    /// Partial records written by acquisition.
    pub fn records(&self) -> PathBuf {
        self.root.join("records.json")
    }

    /// Full records written by enrichment.
    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn failed_metadata(&self) -> PathBuf {
        self.root.join("failed_metadata.txt")
    }

    pub fn run_log(&self) -> PathBuf {
        self.root.join("run.log")
    }

    pub fn clones_dir(&self) -> PathBuf {
        self.root.join("clones")
    }

    pub fn clone_dir(&self, id: &RepoId) -> PathBuf {
        self.clones_dir().join(id.dir_name())
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join("dataset")
    }

    pub fn tests_dataset(&self) -> PathBuf {
        self.dataset_dir().join("python_tests.json")
    }

    pub fn extraction_report(&self) -> PathBuf {
        self.dataset_dir().join("extraction_metadata.json")
    }

    pub fn deduped_dataset(&self) -> PathBuf {
        self.dataset_dir().join("python_tests_deduped.json")
    }

    pub fn dedup_report(&self) -> PathBuf {
        self.dataset_dir().join("deduplication_stats.json")
    }

    pub fn normalized_dataset(&self) -> PathBuf {
        self.dataset_dir().join("python_tests_normalized.json")
    }
}
