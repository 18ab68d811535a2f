//! Ownership of a local checkout directory

use std::path::{Path, PathBuf};

/// A checkout owned by the worker that created it.
///
/// Dropping it removes the directory unless [`Checkout::keep`] was called,
/// so every reject and failure path cleans up on its own.
pub struct Checkout {
    root: PathBuf,
    keep: bool,
}

impl Checkout {
    pub fn new(root: PathBuf) -> Self {
        Self { root, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Leave the directory on disk and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.root.clone()
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if !self.keep && self.root.exists() {
            if let Err(err) = std::fs::remove_dir_all(&self.root) {
                tracing::warn!("Failed to remove checkout {}: {}", self.root.display(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Checkout;
    use tempfile::TempDir;

    #[test]
    fn dropped_checkout_is_removed() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("o__r");
        std::fs::create_dir_all(dir.join("src")).unwrap();

        drop(Checkout::new(dir.clone()));
        assert!(!dir.exists());
    }

    #[test]
    fn kept_checkout_survives() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("o__r");
        std::fs::create_dir_all(&dir).unwrap();

        let kept = Checkout::new(dir.clone()).keep();
        assert_eq!(kept, dir);
        assert!(dir.exists());
    }
}
