//! Retrying batch runner with wave-bounded concurrency.
//!
//! Items are dispatched in waves of at most `concurrency`; a wave is joined
//! before the next one starts. Retryable failures from a full pass are run
//! again after a fixed delay, up to `max_retries` extra rounds. Failures left
//! over, and non-retryable ones, are reported rather than raised: a batch
//! never fails as a whole.
//!
//! Workers must be idempotent, since a retried item runs its worker again.

use crate::error::HarvestError;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fmt::Display;
use std::time::Duration;

/// Errors that know whether a retry could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for HarvestError {
    fn is_retryable(&self) -> bool {
        HarvestError::is_retryable(self)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub concurrency: usize,
    pub max_retries: usize,
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4, max_retries: 3, retry_delay: Duration::from_secs(5) }
    }
}

/// An item that did not succeed within the retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<T> {
    pub item: T,
    pub error: String,
    pub attempts: usize,
}

#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<Failure<T>>,
    /// Retry rounds actually run after the first pass.
    pub retry_rounds: usize,
}

impl<T> BatchReport<T> {
    pub fn failed_items(&self) -> impl Iterator<Item = &T> {
        self.failed.iter().map(|f| &f.item)
    }
}

pub struct BatchRunner {
    config: BatchConfig,
    pool: ThreadPool,
}

impl BatchRunner {
    pub fn new(mut config: BatchConfig) -> Result<Self> {
        config.concurrency = config.concurrency.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("harvest-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn run<T, E, F>(&self, items: Vec<T>, worker: F) -> BatchReport<T>
    where
        T: Send + Sync,
        E: Retryable + Display + Send,
        F: Fn(&T) -> std::result::Result<(), E> + Sync,
    {
        let mut report = BatchReport { succeeded: Vec::new(), failed: Vec::new(), retry_rounds: 0 };
        let mut pending = items;

        loop {
            let attempt = report.retry_rounds + 1;
            let mut retry = Vec::new();
            let mut remaining = pending.into_iter();

            loop {
                let wave: Vec<T> = remaining.by_ref().take(self.config.concurrency).collect();
                if wave.is_empty() {
                    break;
                }
                let results: Vec<std::result::Result<(), E>> =
                    self.pool.install(|| wave.par_iter().map(|item| worker(item)).collect());

                for (item, result) in wave.into_iter().zip(results) {
                    match result {
                        Ok(()) => report.succeeded.push(item),
                        Err(e) if e.is_retryable() => retry.push((item, e.to_string())),
                        Err(e) => {
                            report.failed.push(Failure { item, error: e.to_string(), attempts: attempt })
                        }
                    }
                }
            }

            if retry.is_empty() {
                break;
            }
            if report.retry_rounds >= self.config.max_retries {
                report.failed.extend(
                    retry.into_iter().map(|(item, error)| Failure { item, error, attempts: attempt }),
                );
                break;
            }

            report.retry_rounds += 1;
            tracing::info!(
                "Retrying {} failed item(s) in {:?} (round {}/{})",
                retry.len(),
                self.config.retry_delay,
                report.retry_rounds,
                self.config.max_retries
            );
            if !self.config.retry_delay.is_zero() {
                std::thread::sleep(self.config.retry_delay);
            }
            pending = retry.into_iter().map(|(item, _)| item).collect();
        }

        report
    }
}
