//! Repository fetching (shallow clones into the data directory)

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

pub mod context;
pub mod git;

pub use context::Checkout;
pub use git::{clone_repository, last_commit_date, normalize_github_url};

/// Produces a local working copy of a repository.
pub trait Fetcher: Send + Sync {
    /// Materialize `url` at `dest`. Failures are terminal for the identifier.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Depth-1 git clone bounded by a timeout.
pub struct GitFetcher {
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        clone_repository(url, dest, self.timeout)
    }
}
