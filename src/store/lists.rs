//! Newline-delimited identifier and URL lists.

use super::write_atomic;
use crate::config::DataLayout;
use crate::domain::ExclusionReason;
use crate::error::{HarvestError, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A set of lines persisted as a plain text file, one entry per line.
///
/// Appends are set-like: an entry already present is not written twice.
pub struct IdList {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl IdList {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Entries in file order, trimmed, blank lines and repeats dropped.
    /// A missing file reads as empty.
    pub fn read(&self) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HarvestError::persistence(&self.path, e)),
        };
        let mut seen = HashSet::new();
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && seen.insert(line.to_string()))
            .map(str::to_string)
            .collect())
    }

    /// Like [`IdList::read`], but the file is an upstream stage's output and must exist.
    pub fn read_required(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Err(HarvestError::MissingInput(self.path.clone()));
        }
        self.read()
    }

    pub fn contains(&self, entry: &str) -> Result<bool> {
        Ok(self.read()?.iter().any(|e| e == entry))
    }

    /// Append `entry` unless present. Returns whether it was added.
    pub fn append(&self, entry: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.contains(entry)? {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarvestError::persistence(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HarvestError::persistence(&self.path, e))?;
        writeln!(file, "{entry}").map_err(|e| HarvestError::persistence(&self.path, e))?;
        Ok(true)
    }

    /// Replace the whole list atomically.
    pub fn write_all<S: AsRef<str>>(&self, entries: &[S]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut content = String::new();
        for entry in entries {
            content.push_str(entry.as_ref());
            content.push('\n');
        }
        write_atomic(&self.path, content.as_bytes())
    }

    /// Drop one entry. Returns whether it was present.
    pub fn remove(&self, entry: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = self.read()?;
        if !entries.iter().any(|e| e == entry) {
            return Ok(false);
        }
        let mut content = String::new();
        for kept in entries.iter().filter(|e| *e != entry) {
            content.push_str(kept);
            content.push('\n');
        }
        write_atomic(&self.path, content.as_bytes())?;
        Ok(true)
    }

    /// Remove the file, e.g. a transient per-run failure list.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HarvestError::persistence(&self.path, e)),
        }
    }
}

/// One [`IdList`] per exclusion reason.
pub struct ExclusionLists {
    lists: BTreeMap<ExclusionReason, IdList>,
}

impl ExclusionLists {
    pub fn open(layout: &DataLayout) -> Self {
        let lists = ExclusionReason::ALL
            .into_iter()
            .map(|reason| (reason, IdList::open(layout.exclusion_list(reason))))
            .collect();
        Self { lists }
    }

    pub fn list(&self, reason: ExclusionReason) -> &IdList {
        &self.lists[&reason]
    }

    /// The reason an identifier was excluded, if any.
    pub fn reason_for(&self, id: &str) -> Result<Option<ExclusionReason>> {
        for (reason, list) in &self.lists {
            if list.contains(id)? {
                return Ok(Some(*reason));
            }
        }
        Ok(None)
    }

    /// Record an exclusion. An identifier already excluded for any reason
    /// keeps its first reason and this call returns `false`.
    pub fn exclude(&self, reason: ExclusionReason, id: &str) -> Result<bool> {
        if self.reason_for(id)?.is_some() {
            return Ok(false);
        }
        self.list(reason).append(id)
    }

    pub fn count(&self, reason: ExclusionReason) -> Result<usize> {
        Ok(self.list(reason).read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_is_set_like() {
        let tmp = TempDir::new().expect("tmp");
        let list = IdList::open(tmp.path().join("ids.txt"));

        assert!(list.append("a/b").unwrap());
        assert!(list.append("c/d").unwrap());
        assert!(!list.append("a/b").unwrap());

        assert_eq!(list.read().unwrap(), vec!["a/b", "c/d"]);
    }

    #[test]
    fn read_trims_and_drops_blank_and_repeated_lines() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("urls.txt");
        std::fs::write(&path, "  u1 \n\nu2\nu1\n").unwrap();

        assert_eq!(IdList::open(&path).read().unwrap(), vec!["u1", "u2"]);
    }

    #[test]
    fn read_required_reports_missing_input() {
        let tmp = TempDir::new().expect("tmp");
        let list = IdList::open(tmp.path().join("absent.txt"));
        assert!(list.read().unwrap().is_empty());
        assert!(matches!(list.read_required(), Err(HarvestError::MissingInput(_))));
    }

    #[test]
    fn identifier_lands_in_at_most_one_exclusion_list() {
        let tmp = TempDir::new().expect("tmp");
        let lists = ExclusionLists::open(&DataLayout::new(tmp.path()));

        assert!(lists.exclude(ExclusionReason::Tutorial, "o/r").unwrap());
        assert!(!lists.exclude(ExclusionReason::NoTests, "o/r").unwrap());

        assert_eq!(lists.reason_for("o/r").unwrap(), Some(ExclusionReason::Tutorial));
        assert_eq!(lists.count(ExclusionReason::NoTests).unwrap(), 0);
        assert_eq!(lists.reason_for("x/y").unwrap(), None);
    }

    #[test]
    fn remove_keeps_other_entries_in_order() {
        let tmp = TempDir::new().expect("tmp");
        let list = IdList::open(tmp.path().join("ids.txt"));
        list.write_all(&["a/b", "c/d", "e/f"]).unwrap();

        assert!(list.remove("c/d").unwrap());
        assert!(!list.remove("c/d").unwrap());
        assert_eq!(list.read().unwrap(), vec!["a/b", "e/f"]);
    }

    #[test]
    fn write_all_then_clear() {
        let tmp = TempDir::new().expect("tmp");
        let list = IdList::open(tmp.path().join("failed.txt"));
        list.write_all(&["a/b", "c/d"]).unwrap();
        assert_eq!(list.read().unwrap().len(), 2);
        list.clear().unwrap();
        assert!(!list.exists());
        list.clear().unwrap();
    }
}
