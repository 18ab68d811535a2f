//! Repository qualification: is a checkout a real, tested project?
//!
//! A checkout is scanned once, then an ordered list of [`Rule`]s decides.
//! The default rules reject tutorials first, then repositories without any
//! test signal. Anything not rejected is accepted with its counts.

pub mod rules;
pub mod scan;

pub use rules::{Rule, RuleOutcome, TestSignalRule, TutorialRule};
pub use scan::{CheckoutScan, CheckoutScanner};

use crate::config::HeuristicConfig;
use crate::domain::{Qualification, Verdict};
use crate::fetch::last_commit_date;
use anyhow::Result;
use std::path::Path;

pub struct Classifier {
    scanner: CheckoutScanner,
    rules: Vec<Box<dyn Rule>>,
}

impl Classifier {
    pub fn from_config(cfg: &HeuristicConfig) -> Result<Self> {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(TutorialRule::new(&cfg.pedagogical_keywords, &cfg.project_keywords)?),
            Box::new(TestSignalRule),
        ];
        Ok(Self::with_rules(CheckoutScanner::from_config(cfg)?, rules))
    }

    pub fn with_rules(scanner: CheckoutScanner, rules: Vec<Box<dyn Rule>>) -> Self {
        Self { scanner, rules }
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Decide whether the checkout at `root` qualifies.
    pub fn classify(&self, root: &Path) -> Result<Verdict> {
        let scan = self.scanner.scan(root)?;

        for rule in &self.rules {
            match rule.evaluate(&scan) {
                RuleOutcome::Neutral => continue,
                RuleOutcome::Reject(reason) => {
                    tracing::debug!("{}: rejected by rule '{}'", root.display(), rule.name());
                    return Ok(Verdict::Reject(reason));
                }
                RuleOutcome::Accept => {
                    tracing::debug!("{}: accepted by rule '{}'", root.display(), rule.name());
                    break;
                }
            }
        }

        Ok(Verdict::Accept(Qualification {
            test_files: scan.test_files,
            framework_files: scan.framework_files,
            total_files: scan.total_files,
            source_files: scan.source_files,
            last_commit: last_commit_date(root).unwrap_or_else(|| "unknown".to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExclusionReason;
    use std::fs;
    use tempfile::TempDir;

    fn classifier() -> Classifier {
        Classifier::from_config(&HeuristicConfig::default()).expect("classifier")
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn accepts_pytest_project() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "README.md", "# fastjson\nA quick JSON parser.\n");
        write(tmp.path(), "fastjson/__init__.py", "def parse(s):\n    return s\n");
        write(tmp.path(), "tests/test_foo.py", "import pytest\n\ndef test_parse():\n    assert True\n");

        let Verdict::Accept(q) = classifier().classify(tmp.path()).unwrap() else {
            panic!("expected accept");
        };
        assert!(q.test_files >= 1);
        assert!(q.framework_count("pytest") >= 1);
        assert_eq!(q.total_files, 3);
        assert_eq!(q.source_files, 2);
        assert_eq!(q.last_commit, "unknown");
    }

    #[test]
    fn tutorial_readme_wins_over_tests() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "README.md", "My TUTORIAL PROJECT for learning Flask\n");
        write(tmp.path(), "tests/test_app.py", "import pytest\n");

        assert_eq!(
            classifier().classify(tmp.path()).unwrap(),
            Verdict::Reject(ExclusionReason::Tutorial)
        );
    }

    #[test]
    fn rejects_checkout_without_test_signal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "README.md", "# tool\n");
        write(tmp.path(), "tool/main.py", "print('hi')\n");

        assert_eq!(
            classifier().classify(tmp.path()).unwrap(),
            Verdict::Reject(ExclusionReason::NoTests)
        );
    }

    #[test]
    fn empty_checkout_is_rejected_not_crashed() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            classifier().classify(tmp.path()).unwrap(),
            Verdict::Reject(ExclusionReason::NoTests)
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "pkg/a_test.py", "import unittest\n");
        let c = classifier();
        assert_eq!(c.classify(tmp.path()).unwrap(), c.classify(tmp.path()).unwrap());
    }

    #[test]
    fn custom_rule_can_accept_early() {
        struct AlwaysAccept;
        impl Rule for AlwaysAccept {
            fn name(&self) -> &str {
                "always"
            }
            fn evaluate(&self, _scan: &CheckoutScan) -> RuleOutcome {
                RuleOutcome::Accept
            }
        }

        let cfg = HeuristicConfig::default();
        let c = Classifier::with_rules(
            CheckoutScanner::from_config(&cfg).unwrap(),
            vec![Box::new(AlwaysAccept), Box::new(TestSignalRule)],
        );
        let tmp = TempDir::new().unwrap();
        assert!(c.classify(tmp.path()).unwrap().is_accept());
        assert_eq!(c.rule_names(), vec!["always", "test-signal"]);
    }
}
