//! Hosting platform API: repository search and per-repository metadata.

pub mod github;

pub use github::GitHubClient;

use crate::domain::{RepoId, RepoRecord};
use crate::error::Result;
use serde::Deserialize;

/// The two calls the pipeline needs from the hosting platform.
pub trait RepoApi: Send + Sync {
    /// One page (1-based) of search results.
    fn search_repositories(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage>;

    fn repository(&self, id: &RepoId) -> Result<RepoMetadata>;
}

/// `language:<lang> stars:<range> pushed:><date>`
pub fn search_query(language: &str, stars: &str, pushed_after: &str) -> String {
    format!("language:{language} stars:{stars} pushed:>{pushed_after}")
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub full_name: String,
    pub clone_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRef {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenseRef {
    pub spdx_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoRef {
    pub full_name: String,
}

/// Repository metadata as returned by `GET /repos/{owner}/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMetadata {
    pub name: String,
    pub owner: OwnerRef,
    pub html_url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub subscribers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub license: Option<LicenseRef>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub fork: bool,
    pub parent: Option<RepoRef>,
    pub source: Option<RepoRef>,
    #[serde(default)]
    pub size: u64,
    pub default_branch: Option<String>,
}

impl RepoMetadata {
    pub fn into_record(self) -> RepoRecord {
        let license = self
            .license
            .and_then(|l| l.spdx_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "none".to_string());

        RepoRecord {
            name: self.name,
            owner: self.owner.login,
            url: self.html_url,
            description: self.description,
            stars: Some(self.stargazers_count),
            forks: Some(self.forks_count),
            watchers: Some(self.subscribers_count),
            open_issues: Some(self.open_issues_count),
            created_at: self.created_at,
            updated_at: self.updated_at,
            pushed_at: self.pushed_at,
            license: Some(license),
            archived: Some(self.archived),
            disabled: Some(self.disabled),
            fork: Some(self.fork),
            parent: self.parent.map(|p| p.full_name),
            source: self.source.map(|s| s.full_name),
            size_kb: Some(self.size),
            default_branch: self.default_branch,
            ..RepoRecord::default()
        }
    }
}
