//! Classify command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::{load, GlobalOpts};
use crate::config::CliOverrides;
use crate::domain::Verdict;
use crate::qualify::Classifier;

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Local checkout to qualify
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

pub fn run(args: ClassifyArgs, global: &GlobalOpts) -> Result<()> {
    let root = args.path.canonicalize()?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let config = load(global, CliOverrides::default())?;
    let classifier = Classifier::from_config(&config.heuristics)?;
    tracing::debug!("Rules: {}", classifier.rule_names().join(", "));

    match classifier.classify(&root)? {
        Verdict::Accept(q) => {
            println!("accept");
            println!("  test files:   {}", q.test_files);
            for (framework, count) in &q.framework_files {
                println!("  {framework:<13} {count}");
            }
            println!("  source files: {}", q.source_files);
            println!("  total files:  {}", q.total_files);
            println!("  last commit:  {}", q.last_commit);
        }
        Verdict::Reject(reason) => println!("reject ({reason})"),
    }
    Ok(())
}
