//! Pipeline stages.
//!
//! Discovery → acquisition → enrichment, then the dataset stages
//! (extraction, deduplication, normalization). Each stage reads the previous
//! stage's files from the data directory, skips work that is already recorded
//! there, and only starts once the previous stage has finished.

pub mod acquire;
pub mod dedup;
pub mod discover;
pub mod enrich;
pub mod extract;
pub mod normalize;

use crate::batch::{BatchConfig, BatchRunner};
use crate::config::{DataLayout, HarvestConfig};
use crate::store::{ExclusionLists, IdList, RecordStore};
use anyhow::Result;
use std::fmt;

/// Handles on every piece of persisted state, shared by all stages.
pub struct Harvest {
    pub config: HarvestConfig,
    pub layout: DataLayout,
    pub urls: IdList,
    /// Star ranges left to re-query after a partial discovery.
    pub failed_ranges: IdList,
    pub tests: IdList,
    pub exclusions: ExclusionLists,
    /// Partial records from acquisition.
    pub records: RecordStore,
    /// Full records from enrichment.
    pub metadata: RecordStore,
    pub failed_metadata: IdList,
}

impl Harvest {
    pub fn open(config: HarvestConfig, layout: DataLayout) -> Self {
        Self {
            urls: IdList::open(layout.url_list()),
            failed_ranges: IdList::open(layout.failed_star_ranges()),
            tests: IdList::open(layout.tests_list()),
            exclusions: ExclusionLists::open(&layout),
            records: RecordStore::open(layout.records()),
            metadata: RecordStore::open(layout.metadata()),
            failed_metadata: IdList::open(layout.failed_metadata()),
            config,
            layout,
        }
    }

    pub fn batch_runner(&self, concurrency: usize) -> Result<BatchRunner> {
        BatchRunner::new(BatchConfig {
            concurrency,
            max_retries: self.config.max_retries,
            retry_delay: self.config.retry_delay(),
        })
    }
}

/// Per-stage totals printed at the end of a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub excluded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageSummary {
    pub fn new(stage: &'static str) -> Self {
        Self { stage, ..Default::default() }
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} summary:", self.stage)?;
        writeln!(f, "  Items:      {}", self.total)?;
        writeln!(f, "  Succeeded:  {}", self.succeeded)?;
        writeln!(f, "  Excluded:   {}", self.excluded)?;
        writeln!(f, "  Skipped:    {}", self.skipped)?;
        write!(f, "  Failed:     {}", self.failed)
    }
}
