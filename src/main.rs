//! repo-harvest: collect tested, non-tutorial repositories into a metadata corpus
//!
//! Searches GitHub for candidate repositories, clones and qualifies them, and
//! records structured metadata for the accepted set.

use anyhow::Result;

fn main() -> Result<()> {
    repo_harvest::cli::run()
}
