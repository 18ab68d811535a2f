//! Normalization: tidy the deduplicated dataset's test bodies.
//!
//! Two textual rewrites: `import x   as  y` collapses to single spaces and
//! `'''` docstrings become `"""`. A rewrite that no longer parses is thrown
//! away and the original body kept.

use super::{Harvest, StageSummary};
use crate::dataset::DatasetEntry;
use crate::error::HarvestError;
use crate::store::write_atomic;
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rustpython_parser::{ast, Parse};

static IMPORT_ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"import\s+([a-zA-Z0-9_]+)\s+as\s+([a-zA-Z0-9_]+)").expect("valid regex")
});

static SINGLE_QUOTED_DOCSTRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'''(.+?)'''").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub tests: usize,
    /// Bodies that changed.
    pub normalized: usize,
    /// Bodies whose rewrite did not parse; kept as they were.
    pub skipped: usize,
}

/// Rewrite one test body. Errors when the result is not valid Python.
pub fn normalize_code(body: &str) -> Result<String> {
    let rewritten = IMPORT_ALIAS_RE.replace_all(body, "import ${1} as ${2}");
    let rewritten = SINGLE_QUOTED_DOCSTRING_RE.replace_all(&rewritten, r#""""${1}""""#);
    ast::Suite::parse(&rewritten, "<test>").map_err(|e| anyhow!("syntax error: {e}"))?;
    Ok(rewritten.into_owned())
}

/// Normalize every test in place.
pub fn normalize_dataset(dataset: &mut [DatasetEntry]) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    for entry in dataset.iter_mut() {
        for test in entry.tests.iter_mut() {
            stats.tests += 1;
            match normalize_code(&test.body) {
                Ok(normalized) if normalized != test.body => {
                    test.body = normalized;
                    stats.normalized += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Keeping {}:{} {} as is: {e}", entry.repo, test.file, test.name);
                    stats.skipped += 1;
                }
            }
        }
    }
    stats
}

pub fn run(harvest: &Harvest) -> Result<StageSummary> {
    let mut summary = StageSummary::new("Normalization");
    let input = harvest.layout.deduped_dataset();
    if !input.is_file() {
        return Err(HarvestError::MissingInput(input).into());
    }

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut dataset: Vec<DatasetEntry> = serde_json::from_str(&content)
        .map_err(|source| HarvestError::CorruptDocument { path: input.clone(), source })?;
    println!("Loaded {} entries from {}", dataset.len(), input.display());

    let stats = normalize_dataset(&mut dataset);

    let output = harvest.layout.normalized_dataset();
    let json = serde_json::to_vec_pretty(&dataset).context("Failed to serialize dataset")?;
    write_atomic(&output, &json)?;
    tracing::info!(
        "Normalized {} of {} tests ({} skipped) into {}",
        stats.normalized,
        stats.tests,
        stats.skipped,
        output.display()
    );
    println!(
        "Normalized {} of {} tests, {} skipped",
        stats.normalized, stats.tests, stats.skipped
    );

    summary.total = stats.tests;
    summary.succeeded = stats.normalized;
    summary.skipped = stats.skipped;
    Ok(summary)
}
