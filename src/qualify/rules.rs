//! Named qualification rules.
//!
//! Each rule inspects a [`CheckoutScan`] and returns accept, reject or
//! neutral. Rules run in order and the first non-neutral outcome wins.

use super::scan::CheckoutScan;
use crate::domain::ExclusionReason;
use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Accept,
    Reject(ExclusionReason),
    Neutral,
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, scan: &CheckoutScan) -> RuleOutcome;
}

/// Rejects repositories whose README reads like teaching material: a
/// pedagogical keyword followed by a project keyword on the same line.
pub struct TutorialRule {
    pattern: Regex,
}

impl TutorialRule {
    pub fn new(pedagogical: &[String], project: &[String]) -> Result<Self> {
        if pedagogical.is_empty() || project.is_empty() {
            anyhow::bail!("Tutorial rule needs at least one pedagogical and one project keyword");
        }
        let alternation =
            |words: &[String]| words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
        let pattern = format!(
            r"(?i)\b(?:{})s?\b.*\b(?:{})s?\b",
            alternation(pedagogical),
            alternation(project)
        );
        let pattern =
            Regex::new(&pattern).with_context(|| format!("Invalid tutorial pattern: {pattern}"))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl Rule for TutorialRule {
    fn name(&self) -> &str {
        "tutorial"
    }

    fn evaluate(&self, scan: &CheckoutScan) -> RuleOutcome {
        for (path, text) in &scan.readmes {
            if let Some(hit) = self.pattern.find(text) {
                tracing::debug!("{}: tutorial marker {:?}", path.display(), hit.as_str());
                return RuleOutcome::Reject(ExclusionReason::Tutorial);
            }
        }
        RuleOutcome::Neutral
    }
}

/// Rejects repositories with no test-named files and no framework markers.
pub struct TestSignalRule;

impl Rule for TestSignalRule {
    fn name(&self) -> &str {
        "test-signal"
    }

    fn evaluate(&self, scan: &CheckoutScan) -> RuleOutcome {
        let signal = scan.test_files + scan.framework_files.values().sum::<usize>();
        if signal == 0 {
            RuleOutcome::Reject(ExclusionReason::NoTests)
        } else {
            RuleOutcome::Neutral
        }
    }
}
