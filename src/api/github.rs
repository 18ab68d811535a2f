//! GitHub REST client

use super::{RepoApi, RepoMetadata, SearchPage};
use crate::domain::RepoId;
use crate::error::{HarvestError, Result};
use anyhow::Context;
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";

/// Blocking client for the two endpoints the pipeline uses.
pub struct GitHubClient {
    client: Client,
    base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repo-harvest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        if token.is_none() {
            tracing::warn!("No GitHub token found; unauthenticated rate limits apply");
        }

        Ok(Self { client, base: base.trim_end_matches('/').to_string(), token })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        target: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base, path);
        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("GET {url} {query:?}");
        let response = request.send().map_err(|e| HarvestError::api(target, e))?;
        let response = check_status(target, response)?;
        response.json::<T>().map_err(|e| HarvestError::api(target, e))
    }
}

/// Map non-success responses onto the error taxonomy.
///
/// 404 and 451 mean the repository is gone for good; everything else
/// (rate limits, 5xx) is worth another attempt.
fn check_status(target: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if matches!(status, StatusCode::NOT_FOUND | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS) {
        return Err(HarvestError::Gone { target: target.to_string(), status: status.as_u16() });
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");
    let reset = response
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().unwrap_or_default();

    let message = if rate_limited {
        format!("HTTP {status}: rate limit exhausted (reset at {})", reset.as_deref().unwrap_or("?"))
    } else {
        let snippet: String = body.chars().take(200).collect();
        format!("HTTP {status}: {snippet}")
    };
    Err(HarvestError::api(target, message))
}

impl RepoApi for GitHubClient {
    fn search_repositories(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage> {
        self.get_json(
            &format!("search '{query}' page {page}"),
            "/search/repositories",
            &[("q", query.to_string()), ("per_page", per_page.to_string()), ("page", page.to_string())],
        )
    }

    fn repository(&self, id: &RepoId) -> Result<RepoMetadata> {
        self.get_json(&id.to_string(), &format!("/repos/{}/{}", id.owner(), id.name()), &[])
    }
}
