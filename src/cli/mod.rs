//! Command-line interface for repo-harvest
//!
//! One subcommand per pipeline stage, plus `run` for the three core stages
//! in order and a few single-repository helpers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::DataLayout;

mod acquire;
mod classify;
mod dedup;
mod discover;
mod enrich;
mod exclude;
mod extract;
mod normalize;
mod run;
mod utils;

use utils::GlobalOpts;

/// Collect tested, non-tutorial GitHub repositories into a metadata corpus
#[derive(Parser)]
#[command(name = "repo-harvest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding lists, records, clones and the dataset
    #[arg(
        short = 'd',
        long,
        global = true,
        value_name = "DIR",
        default_value = ".",
        env = "REPO_HARVEST_DATA_DIR"
    )]
    data_dir: PathBuf,

    /// Config file (TOML or YAML); otherwise discovered in the data directory
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for candidate repositories and write the URL list
    Discover(discover::DiscoverArgs),

    /// Clone and qualify every discovered repository
    Acquire(acquire::AcquireArgs),

    /// Fetch metadata for every accepted repository
    Enrich(enrich::EnrichArgs),

    /// Discovery, acquisition and enrichment in sequence
    Run(run::RunArgs),

    /// Qualify a local checkout without touching the data directory
    Classify(classify::ClassifyArgs),

    /// Extract Python test functions from the kept clones
    Extract(extract::ExtractArgs),

    /// Remove duplicate tests from the extracted dataset
    Dedup(dedup::DedupArgs),

    /// Tidy imports and docstrings in the deduplicated dataset
    Normalize(normalize::NormalizeArgs),

    /// Exclude a repository by hand and drop its records
    Exclude(exclude::ExcludeArgs),
}

impl Commands {
    /// Whether the command works inside the data directory and should log to its run log.
    fn uses_data_dir(&self) -> bool {
        !matches!(self, Commands::Classify(_))
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let global = GlobalOpts { data_dir: cli.data_dir, config: cli.config };
    match cli.command {
        Commands::Discover(args) => discover::run(args, &global),
        Commands::Acquire(args) => acquire::run(args, &global),
        Commands::Enrich(args) => enrich::run(args, &global),
        Commands::Run(args) => run::run(args, &global),
        Commands::Classify(args) => classify::run(args, &global),
        Commands::Extract(args) => extract::run(args, &global),
        Commands::Dedup(args) => dedup::run(args, &global),
        Commands::Normalize(args) => normalize::run(args, &global),
        Commands::Exclude(args) => exclude::run(args, &global),
    }
}

/// Stderr gets WARN (DEBUG with `--verbose`, RUST_LOG always wins); the run
/// log in the data directory gets INFO and up without colors.
fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    let run_log = if cli.command.uses_data_dir() {
        let path = DataLayout::new(&cli.data_dir).run_log();
        std::fs::create_dir_all(&cli.data_dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
            .map_err(|e| eprintln!("warning: cannot open run log {}: {e}", path.display()))
            .ok()
    } else {
        None
    };
    let file_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let file_layer = run_log.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(Mutex::new(file))
            .with_filter(file_level)
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(file_layer)
        .try_init();
}
