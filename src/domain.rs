//! Core domain types shared across stages.

use crate::error::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `owner/name` identifier of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn new(owner: &str, name: &str) -> Result<Self, HarvestError> {
        let valid = |s: &str| {
            !s.is_empty()
                && s != "."
                && s != ".."
                && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return Err(HarvestError::InvalidIdentifier(format!("{owner}/{name}")));
        }
        Ok(Self { owner: owner.to_string(), name: name.to_string() })
    }

    /// Parse an identifier out of a clone or browse URL.
    ///
    /// Accepts `https://host/owner/name(.git)`, `git@host:owner/name.git`
    /// and bare `owner/name`.
    pub fn from_url(url: &str) -> Result<Self, HarvestError> {
        let trimmed = url.trim().trim_end_matches('/');
        let path = if let Some(pos) = trimmed.find("://") {
            let after_scheme = &trimmed[pos + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash + 1..],
                None => return Err(HarvestError::InvalidIdentifier(url.to_string())),
            }
        } else if let Some((_, rest)) = trimmed.split_once(':').filter(|(h, _)| h.contains('@')) {
            rest
        } else {
            trimmed
        };

        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Self::new(owner, name),
            _ => Err(HarvestError::InvalidIdentifier(url.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem-safe directory name for the local checkout.
    pub fn dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains("://") || s.contains('@') {
            return Self::from_url(s);
        }
        match s.trim().split_once('/') {
            Some((owner, name)) => Self::new(owner, name),
            None => Err(HarvestError::InvalidIdentifier(s.to_string())),
        }
    }
}

/// Why an identifier was excluded from the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    Tutorial,
    NoTests,
    CloneFailure,
    MetadataFailure,
}

impl ExclusionReason {
    pub const ALL: [ExclusionReason; 4] =
        [Self::Tutorial, Self::NoTests, Self::CloneFailure, Self::MetadataFailure];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tutorial => "tutorial",
            Self::NoTests => "no-tests",
            Self::CloneFailure => "clone-failure",
            Self::MetadataFailure => "metadata-failure",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Tutorial => "excluded_tutorial.txt",
            Self::NoTests => "excluded_no_tests.txt",
            Self::CloneFailure => "excluded_clone_failure.txt",
            Self::MetadataFailure => "excluded_metadata_failure.txt",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExclusionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                format!(
                    "Invalid exclusion reason '{s}' (expected one of: {})",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Counts gathered from an accepted checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualification {
    /// Source files matching test naming conventions or living under a test directory.
    pub test_files: usize,
    /// Source files carrying each framework marker, keyed by framework name.
    pub framework_files: BTreeMap<String, usize>,
    pub total_files: usize,
    pub source_files: usize,
    /// `YYYY-MM-DD` of the HEAD commit, or `"unknown"`.
    pub last_commit: String,
}

impl Qualification {
    pub fn framework_count(&self, framework: &str) -> usize {
        self.framework_files.get(framework).copied().unwrap_or(0)
    }

    pub fn test_signal(&self) -> usize {
        self.test_files + self.framework_files.values().sum::<usize>()
    }
}

/// Outcome of qualifying a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(Qualification),
    Reject(ExclusionReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }
}

/// Metadata kept for one accepted repository.
///
/// Acquisition fills identity and the qualification counts; enrichment adds
/// the hosting-platform fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoRecord {
    pub name: String,
    pub owner: String,
    pub url: String,
    pub description: Option<String>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub watchers: Option<u64>,
    pub open_issues: Option<u64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub license: Option<String>,
    pub archived: Option<bool>,
    pub disabled: Option<bool>,
    pub fork: Option<bool>,
    pub parent: Option<String>,
    pub source: Option<String>,
    pub size_kb: Option<u64>,
    pub default_branch: Option<String>,
    pub test_files: usize,
    pub framework_files: BTreeMap<String, usize>,
    pub total_files: usize,
    pub source_files: usize,
    pub last_commit: String,
}

impl RepoRecord {
    pub fn from_qualification(id: &RepoId, url: &str, q: &Qualification) -> Self {
        Self {
            name: id.name().to_string(),
            owner: id.owner().to_string(),
            url: url.to_string(),
            test_files: q.test_files,
            framework_files: q.framework_files.clone(),
            total_files: q.total_files,
            source_files: q.source_files,
            last_commit: q.last_commit.clone(),
            ..Self::default()
        }
    }

    /// Copy the checkout-derived counts from an acquisition record.
    pub fn with_counts_from(mut self, other: &RepoRecord) -> Self {
        self.test_files = other.test_files;
        self.framework_files = other.framework_files.clone();
        self.total_files = other.total_files;
        self.source_files = other.source_files;
        self.last_commit = other.last_commit.clone();
        self
    }
}
