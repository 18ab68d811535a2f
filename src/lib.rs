//! Library surface for the repo-harvest pipeline.
//!
//! Stages live in [`pipeline`]; the pieces they compose (record store,
//! batch runner, qualification heuristic, hosting API, clone fetcher) are
//! usable on their own.

pub mod api;
pub mod batch;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod qualify;
pub mod store;
pub mod utils;

pub use error::{HarvestError, Result};
