//! Error taxonomy for pipeline workers.
//!
//! Classification rejects are not errors; see [`crate::domain::Verdict`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// A search or metadata call failed; safe to retry.
    #[error("API request for {target} failed: {message}")]
    TransientApi { target: String, message: String },

    /// The resource is permanently unavailable (deleted, blocked, DMCA).
    #[error("{target} is unavailable: HTTP {status}")]
    Gone { target: String, status: u16 },

    /// Cloning failed. Terminal for the identifier within a run.
    #[error("clone of {url} failed: {message}")]
    Clone { url: String, message: String },

    #[error("failed writing {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {} is not valid JSON: {source}", path.display())]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    #[error("required input file not found: {}", .0.display())]
    MissingInput(PathBuf),
}

impl HarvestError {
    pub fn api(target: impl Into<String>, message: impl ToString) -> Self {
        Self::TransientApi { target: target.into(), message: message.to_string() }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence { path: path.into(), source }
    }

    /// Whether the batch runner may put the item back into the retry set.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientApi { .. } | Self::Persistence { .. })
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
