//! JSON record store keyed by repository identifier.

use super::write_atomic;
use crate::domain::{RepoId, RepoRecord};
use crate::error::{HarvestError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub type RecordMap = BTreeMap<String, RepoRecord>;

/// Identifier → record document persisted as one pretty-printed JSON object.
///
/// Upserts are load, merge, atomic replace. The mutex serializes writers in
/// this process; writers in other processes can still lose updates.
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has(&self, id: &RepoId) -> Result<bool> {
        Ok(self.load()?.contains_key(&id.to_string()))
    }

    pub fn get(&self, id: &RepoId) -> Result<Option<RepoRecord>> {
        Ok(self.load()?.remove(&id.to_string()))
    }

    pub fn upsert(&self, id: &RepoId, record: RepoRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.load()?;
        doc.insert(id.to_string(), record);
        self.replace(&doc)
    }

    /// Drop a record. Only explicit exclusion removes records.
    pub fn remove(&self, id: &RepoId) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.load()?;
        if doc.remove(&id.to_string()).is_none() {
            return Ok(false);
        }
        self.replace(&doc)?;
        Ok(true)
    }

    pub fn entries(&self) -> Result<RecordMap> {
        self.load()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn load(&self) -> Result<RecordMap> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => return Err(HarvestError::persistence(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|source| HarvestError::CorruptDocument { path: self.path.clone(), source })
    }

    fn replace(&self, doc: &RecordMap) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(doc)
            .map_err(|source| HarvestError::CorruptDocument { path: self.path.clone(), source })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)
    }
}
