//! Pipeline configuration
//!
//! Precedence: CLI flags, then the config file, then defaults. The API token
//! never comes from the config file: `GITHUB_TOKEN`, then `GH_TOKEN`, then
//! `gh auth token`.

pub mod layout;
pub mod loader;
pub mod merge;

pub use layout::DataLayout;
pub use loader::load_config;
pub use merge::{merge_cli_with_config, CliOverrides};

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::time::Duration as StdDuration;

/// Pipeline settings. Every field has a default so partial files are fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Search `language:` qualifier.
    pub language: String,
    /// Star buckets queried separately to stay under the search result ceiling.
    #[serde(deserialize_with = "string_or_list")]
    pub star_ranges: Vec<String>,
    /// `pushed:>` date (`YYYY-MM-DD`); one year before today when unset.
    pub pushed_after: Option<String>,
    pub per_page: u32,
    /// Results the search API returns at most per query.
    pub max_results: u32,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub clone_timeout_secs: u64,
    pub acquire_concurrency: usize,
    pub enrich_concurrency: usize,
    pub max_retries: usize,
    pub retry_delay_secs: u64,
    pub heuristics: HeuristicConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            star_ranges: ["100..199", "200..499", "500..999", "1000..4999", ">=5000"]
                .map(String::from)
                .to_vec(),
            pushed_after: None,
            per_page: 100,
            max_results: 1000,
            api_base: "https://api.github.com".to_string(),
            request_timeout_secs: 30,
            clone_timeout_secs: 120,
            acquire_concurrency: 4,
            enrich_concurrency: 4,
            max_retries: 3,
            retry_delay_secs: 5,
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl HarvestConfig {
    pub fn pushed_after(&self) -> String {
        self.pushed_after.clone().unwrap_or_else(|| {
            (Utc::now() - Duration::days(365)).format("%Y-%m-%d").to_string()
        })
    }

    /// Configured star ranges that the search syntax accepts; others are
    /// dropped with a warning.
    pub fn valid_star_ranges(&self) -> Vec<String> {
        self.star_ranges
            .iter()
            .map(|r| r.trim())
            .filter(|r| {
                let ok = is_star_range(r);
                if !ok {
                    tracing::warn!("Ignoring malformed star range '{r}'");
                }
                ok
            })
            .map(str::to_string)
            .collect()
    }

    pub fn retry_delay(&self) -> StdDuration {
        StdDuration::from_secs(self.retry_delay_secs)
    }

    pub fn clone_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.clone_timeout_secs)
    }
}

static STAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+\.\.\d+|\d+\.\.\*|\*\.\.\d+|[<>]=?\d+|\d+)$").expect("valid star range regex")
});

/// `100..199`, `>=5000`, `<10`, `42`, `10..*`.
pub fn is_star_range(range: &str) -> bool {
    STAR_RANGE_RE.is_match(range)
}

/// Knobs for the qualification rules.
///
/// These are noisy by nature: a keyword in an unrelated sentence or a stray
/// file under `tests/` still counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub pedagogical_keywords: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub project_keywords: Vec<String>,
    /// Globs matched against file names.
    #[serde(deserialize_with = "string_or_list")]
    pub test_file_globs: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub test_dirs: Vec<String>,
    #[serde(deserialize_with = "extension_list")]
    pub source_extensions: Vec<String>,
    pub primary_framework: FrameworkMarker,
    pub secondary_framework: FrameworkMarker,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            pedagogical_keywords: ["tutorial", "course", "homework", "example", "demo", "starter"]
                .map(String::from)
                .to_vec(),
            project_keywords: ["code", "project"].map(String::from).to_vec(),
            test_file_globs: ["test_*", "*_test.*", "*_spec.*", "tests.*"].map(String::from).to_vec(),
            test_dirs: ["test", "tests"].map(String::from).to_vec(),
            source_extensions: vec![".py".to_string()],
            primary_framework: FrameworkMarker {
                name: "pytest".to_string(),
                pattern: r"(?m)^\s*(import\s+pytest|from\s+pytest\b)|@pytest\.".to_string(),
            },
            secondary_framework: FrameworkMarker {
                name: "unittest".to_string(),
                pattern: r"(?m)^\s*(import\s+unittest|from\s+unittest\b)|unittest\.TestCase"
                    .to_string(),
            },
        }
    }
}

/// A named regex whose presence in a source file signals a test framework.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkMarker {
    pub name: String,
    pub pattern: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept either `"a, b"` or `["a", "b"]`, trimming entries and dropping empties.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(v) => v,
    };
    Ok(raw.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

/// Like [`string_or_list`], lowercasing and adding the leading dot.
fn extension_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_list(deserializer)?
        .into_iter()
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect())
}

/// GitHub token from the environment, falling back to the `gh` CLI.
pub fn github_token() -> Option<String> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = std::env::var(var) {
            if !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
    }

    let output = std::process::Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
