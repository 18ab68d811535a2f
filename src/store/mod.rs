//! File-backed state shared by the pipeline stages.
//!
//! Every whole-document write goes through [`write_atomic`]: readers see the
//! old or the new content, never a torn file.

pub mod lists;
pub mod records;

pub use lists::{ExclusionLists, IdList};
pub use records::RecordStore;

use crate::error::{HarvestError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `bytes` to a temp file beside `path`, then rename it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| HarvestError::persistence(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HarvestError::persistence(path, e))?;
    tmp.write_all(bytes).map_err(|e| HarvestError::persistence(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| HarvestError::persistence(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| HarvestError::persistence(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_content_and_leaves_no_temp_files() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("nested").join("doc.json");

        write_atomic(&path, b"{}").expect("first write");
        write_atomic(&path, b"{\"a\":1}").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
