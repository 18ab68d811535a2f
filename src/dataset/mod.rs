//! Test-function dataset built from accepted checkouts.

pub mod python;

pub use python::extract_tests;

use serde::{Deserialize, Serialize};

/// One extracted test with its exact source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Function name, or `Class.method` for `TestCase` methods.
    pub name: String,
    pub body: String,
    /// Path relative to the checkout root.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// All tests found in one file of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub repo: String,
    pub file: String,
    pub tests: Vec<TestCase>,
}

impl DatasetEntry {
    /// `repo:file`, unique per dataset.
    pub fn key(&self) -> String {
        format!("{}:{}", self.repo, self.file)
    }
}
