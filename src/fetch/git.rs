//! Shallow cloning and HEAD queries

use crate::error::{HarvestError, Result};
use chrono::DateTime;
use git2::build::RepoBuilder;
use git2::{FetchOptions, RemoteCallbacks, Repository};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Clone `url` into `dest` at depth 1, giving up after `timeout`.
///
/// Transports that refuse shallow fetches (local paths, some mirrors) get a
/// full clone within whatever time is left. `dest` is wiped first so a
/// leftover from an interrupted run never blocks the clone.
///
/// The clone runs on its own thread so a remote that stalls before sending
/// any pack data still times out. An abandoned clone thread aborts at its
/// next progress callback and removes whatever it wrote.
pub fn clone_repository(url: &str, dest: &Path, timeout: Duration) -> Result<()> {
    let clone_err = |message: String| HarvestError::Clone { url: url.to_string(), message };

    if dest.exists() {
        std::fs::remove_dir_all(dest)
            .map_err(|e| clone_err(format!("cannot clear {}: {e}", dest.display())))?;
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| clone_err(format!("cannot create {}: {e}", parent.display())))?;
    }

    let (tx, rx) = mpsc::channel();
    let worker_url = url.to_string();
    let worker_dest = dest.to_path_buf();
    thread::Builder::new()
        .name("git-clone".into())
        .spawn(move || {
            let started = Instant::now();
            let result = clone_within(&worker_url, &worker_dest, started, timeout);
            if result.is_ok() && started.elapsed() >= timeout {
                // Finished after the caller gave up; the caller already reported a timeout.
                let _ = std::fs::remove_dir_all(&worker_dest);
            }
            let _ = tx.send(result);
        })
        .map_err(|e| clone_err(format!("cannot start clone thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("Clone of {url} exceeded {}s; abandoning it", timeout.as_secs());
            Err(clone_err(format!("timed out after {}s", timeout.as_secs())))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(clone_err("clone thread exited without a result".to_string()))
        }
    }
}

fn clone_within(url: &str, dest: &Path, started: Instant, timeout: Duration) -> Result<()> {
    let clone_err = |message: String| HarvestError::Clone { url: url.to_string(), message };
    let normalized = normalize_github_url(url);

    match clone_with_deadline(&normalized, dest, started, timeout, Some(1)) {
        Ok(()) => Ok(()),
        Err(_) if started.elapsed() >= timeout => {
            Err(clone_err(format!("timed out after {}s", timeout.as_secs())))
        }
        Err(shallow_err) => {
            tracing::debug!("Shallow clone of {url} failed ({shallow_err}); trying full clone");
            let _ = std::fs::remove_dir_all(dest);
            clone_with_deadline(&normalized, dest, started, timeout, None).map_err(|e| {
                if started.elapsed() >= timeout {
                    clone_err(format!("timed out after {}s", timeout.as_secs()))
                } else {
                    clone_err(e.message().to_string())
                }
            })
        }
    }
}

fn clone_with_deadline(
    url: &str,
    dest: &Path,
    started: Instant,
    timeout: Duration,
    depth: Option<i32>,
) -> std::result::Result<(), git2::Error> {
    let mut callbacks = RemoteCallbacks::new();
    // Returning false from the progress callback aborts the transfer.
    callbacks.transfer_progress(move |_progress| started.elapsed() < timeout);

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(callbacks);
    if let Some(depth) = depth {
        fo.depth(depth);
    }

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fo);
    builder.clone(url, dest).map(|_| ())
}

/// Normalize a GitHub URL to the canonical HTTPS `.git` form.
///
/// - `https://github.com/owner/repo`     → `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo/`    → `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo.git` → unchanged
/// - non-GitHub URLs                     → unchanged
pub fn normalize_github_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.contains("github.com") && !trimmed.ends_with(".git") {
        format!("{}.git", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Date (`YYYY-MM-DD`, UTC) of the HEAD commit of the repository at `root`.
pub fn last_commit_date(root: &Path) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let commit = repo.head().ok()?.peel_to_commit().ok()?;
    let when = DateTime::from_timestamp(commit.time().seconds(), 0)?;
    Some(when.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn init_repo_with_commit(dir: &Path, epoch_secs: i64) {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("test_x.py"), "import pytest\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("test_x.py")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::new("t", "t@example.com", &git2::Time::new(epoch_secs, 0)).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();
    }

    #[test]
    fn normalizes_github_urls() {
        assert_eq!(normalize_github_url("https://github.com/o/r"), "https://github.com/o/r.git");
        assert_eq!(normalize_github_url("https://github.com/o/r/"), "https://github.com/o/r.git");
        assert_eq!(normalize_github_url("https://github.com/o/r.git"), "https://github.com/o/r.git");
        assert_eq!(normalize_github_url("/srv/git/r"), "/srv/git/r");
    }

    #[test]
    fn last_commit_date_reads_head() {
        let tmp = TempDir::new().unwrap();
        // 2024-03-15T12:00:00Z
        init_repo_with_commit(tmp.path(), 1_710_504_000);
        assert_eq!(last_commit_date(tmp.path()).as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn last_commit_date_is_none_outside_a_repository() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(last_commit_date(tmp.path()), None);
    }

    #[test]
    fn clones_a_local_repository() {
        let src = TempDir::new().unwrap();
        init_repo_with_commit(src.path(), 1_710_504_000);
        let out = TempDir::new().unwrap();
        let dest = out.path().join("clones").join("o__r");

        clone_repository(src.path().to_str().unwrap(), &dest, Duration::from_secs(60)).unwrap();
        assert!(dest.join("test_x.py").exists());
        assert_eq!(last_commit_date(&dest).as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn clone_failure_is_terminal() {
        let out = TempDir::new().unwrap();
        let missing = out.path().join("no-such-repo");
        let err = clone_repository(
            missing.to_str().unwrap(),
            &out.path().join("dest"),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, HarvestError::Clone { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn stalled_remote_times_out() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });

        let out = TempDir::new().unwrap();
        let started = Instant::now();
        let err = clone_repository(
            &format!("http://127.0.0.1:{port}/o/r.git"),
            &out.path().join("dest"),
            Duration::from_secs(2),
        )
        .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(20));
        assert!(matches!(err, HarvestError::Clone { .. }));
        assert!(err.to_string().contains("timed out"), "{err}");
    }
}
