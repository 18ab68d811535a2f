//! Single pass over a checkout collecting everything the rules look at.

use crate::config::HeuristicConfig;
use crate::utils::{is_binary_file, read_file_safe};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SAMPLE_SIZE: usize = 8192;
const MAX_FILE_BYTES: u64 = 1_048_576;

/// Facts about one checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutScan {
    pub root: PathBuf,
    pub total_files: usize,
    pub source_files: usize,
    pub test_files: usize,
    pub framework_files: BTreeMap<String, usize>,
    /// Root-level README-like files and their text.
    pub readmes: Vec<(PathBuf, String)>,
}

struct FrameworkPattern {
    name: String,
    regex: Regex,
}

/// Walks a checkout, skipping `.git`, and counts files, test files and
/// framework markers.
pub struct CheckoutScanner {
    source_extensions: Vec<String>,
    test_file_globs: GlobSet,
    test_dirs: Vec<String>,
    frameworks: Vec<FrameworkPattern>,
}

impl CheckoutScanner {
    pub fn from_config(cfg: &HeuristicConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &cfg.test_file_globs {
            let glob = Glob::new(&pattern.to_ascii_lowercase())
                .with_context(|| format!("Invalid test file glob: {pattern}"))?;
            builder.add(glob);
        }

        let frameworks = [&cfg.primary_framework, &cfg.secondary_framework]
            .into_iter()
            .map(|marker| {
                let regex = Regex::new(&marker.pattern).with_context(|| {
                    format!("Invalid marker pattern for {}: {}", marker.name, marker.pattern)
                })?;
                Ok(FrameworkPattern { name: marker.name.clone(), regex })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source_extensions: cfg.source_extensions.clone(),
            test_file_globs: builder.build()?,
            test_dirs: cfg.test_dirs.iter().map(|d| d.to_ascii_lowercase()).collect(),
            frameworks,
        })
    }

    pub fn scan(&self, root: &Path) -> Result<CheckoutScan> {
        if !root.is_dir() {
            anyhow::bail!("Checkout is not a directory: {}", root.display());
        }

        let mut scan = CheckoutScan { root: root.to_path_buf(), ..Default::default() };
        for fw in &self.frameworks {
            scan.framework_files.insert(fw.name.clone(), 0);
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            scan.total_files += 1;

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase();

            if entry.depth() == 1 && file_name.starts_with("readme") {
                match read_file_safe(path) {
                    Ok(text) => scan.readmes.push((path.to_path_buf(), text)),
                    Err(err) => tracing::debug!("Unreadable README {}: {:#}", path.display(), err),
                }
            }

            if !self.is_source_file(&file_name) {
                continue;
            }
            scan.source_files += 1;

            if self.is_test_file(relative, &file_name) {
                scan.test_files += 1;
            }

            let Some(content) = self.read_source(path) else {
                continue;
            };
            for fw in &self.frameworks {
                if fw.regex.is_match(&content) {
                    *scan.framework_files.entry(fw.name.clone()).or_insert(0) += 1;
                }
            }
        }

        Ok(scan)
    }

    fn is_source_file(&self, file_name: &str) -> bool {
        self.source_extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
    }

    /// Name matches a test glob, or some parent directory is a test directory.
    fn is_test_file(&self, relative: &Path, file_name: &str) -> bool {
        if self.test_file_globs.is_match(file_name) {
            return true;
        }
        relative
            .parent()
            .map(|dir| {
                dir.components().any(|c| {
                    let part = c.as_os_str().to_string_lossy().to_lowercase();
                    self.test_dirs.contains(&part)
                })
            })
            .unwrap_or(false)
    }

    fn read_source(&self, path: &Path) -> Option<String> {
        let size = path.metadata().ok()?.len();
        if size > MAX_FILE_BYTES || is_binary_file(path, SAMPLE_SIZE) {
            return None;
        }
        read_file_safe(path).ok()
    }
}
