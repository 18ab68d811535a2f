//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn harvest() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("repo-harvest"))
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_cli_version() {
    harvest().arg("--version").assert().success().stdout(predicate::str::contains("repo-harvest"));
}

#[test]
fn test_cli_help() {
    harvest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Collect tested"))
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("acquire"))
        .stdout(predicate::str::contains("enrich"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("dedup"))
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("exclude"));
}

#[test]
fn test_classify_accepts_tested_project() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "README.md", "# Widget\n\nA library for widgets.\n");
    write(repo.path(), "widget/core.py", "def spin():\n    return 1\n");
    write(
        repo.path(),
        "tests/test_core.py",
        "import pytest\nfrom widget.core import spin\n\ndef test_spin():\n    assert spin() == 1\n",
    );

    harvest()
        .args(["classify"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("accept"))
        .stdout(predicate::str::contains("test files:   1"))
        .stdout(predicate::str::contains("last commit:  unknown"));
}

#[test]
fn test_classify_rejects_tutorial() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "README.md", "# Learn Flask\n\nThis is a tutorial project for beginners.\n");
    write(repo.path(), "tests/test_app.py", "import pytest\n\ndef test_app():\n    pass\n");

    harvest()
        .arg("classify")
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("reject (tutorial)"));
}

#[test]
fn test_classify_rejects_missing_path() {
    harvest()
        .args(["classify", "/definitely/not/a/checkout"])
        .assert()
        .failure();
}

#[test]
fn test_enrich_requires_tests_list() {
    let data = TempDir::new().unwrap();
    harvest()
        .args(["enrich", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("repos_with_tests.txt"));
}

#[test]
fn test_acquire_requires_url_list() {
    let data = TempDir::new().unwrap();
    harvest()
        .args(["acquire", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("repo_urls.txt"));
}

#[test]
fn test_exclude_rejects_unknown_reason() {
    let data = TempDir::new().unwrap();
    harvest()
        .args(["exclude", "psf/requests", "--reason", "boring", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid exclusion reason"));
}

#[test]
fn test_exclude_drops_records_and_lists_the_repo() {
    let data = TempDir::new().unwrap();
    write(
        data.path(),
        "records.json",
        r#"{"psf/requests": {"name": "requests", "owner": "psf", "test_files": 3}, "a/b": {"name": "b", "owner": "a"}}"#,
    );
    write(data.path(), "repos_with_tests.txt", "psf/requests\na/b\n");
    write(data.path(), "clones/psf__requests/setup.py", "");

    harvest()
        .args(["exclude", "https://github.com/psf/requests.git", "--reason", "tutorial", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Excluded psf/requests (tutorial)"));

    let records = fs::read_to_string(data.path().join("records.json")).unwrap();
    assert!(!records.contains("psf/requests"));
    assert!(records.contains("a/b"));
    let listed = fs::read_to_string(data.path().join("repos_with_tests.txt")).unwrap();
    assert_eq!(listed, "a/b\n");
    let excluded = fs::read_to_string(data.path().join("excluded_tutorial.txt")).unwrap();
    assert_eq!(excluded, "psf/requests\n");
    assert!(!data.path().join("clones/psf__requests").exists());
    assert!(data.path().join("run.log").exists());
}

#[test]
fn test_extract_then_dedup() {
    let data = TempDir::new().unwrap();
    write(data.path(), "repos_with_tests.txt", "a/one\nb/two\nc/missing\n");
    let shared = "def test_shared():\n    assert 1\n";
    write(
        data.path(),
        "clones/a__one/tests/test_a.py",
        &format!("{shared}\ndef test_only_a():\n    assert 2\n"),
    );
    write(data.path(), "clones/b__two/tests/test_b.py", shared);

    harvest()
        .args(["extract", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Extraction summary"));

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(data.path().join("dataset/extraction_metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["total_repositories"], 3);
    assert_eq!(report["successful_repositories"], 2);
    assert_eq!(report["total_test_functions_found"], 3);
    assert_eq!(report["repositories"]["c/missing"]["status"], "skipped");
    assert_eq!(report["repositories"]["a/one"]["failed_files_count"], 0);
    assert_eq!(report["repositories"]["c/missing"]["failed_files_count"], 0);

    harvest()
        .args(["dedup", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept 2 of 3 tests"));

    let stats: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(data.path().join("dataset/deduplication_stats.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stats["duplicate_tests"], 1);
    assert_eq!(stats["unique_entries"], 1);
    assert_eq!(stats["top_duplicate_repos"][0]["repo"], "b/two");
}

#[test]
fn test_dedup_requires_dataset() {
    let data = TempDir::new().unwrap();
    harvest()
        .args(["dedup", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("python_tests.json"));
}

#[test]
fn test_normalize_writes_normalized_dataset() {
    let data = TempDir::new().unwrap();
    write(
        data.path(),
        "dataset/python_tests_deduped.json",
        r#"[{"repo": "a/one", "file": "tests/test_a.py", "tests": [
            {"name": "test_alias", "body": "def test_alias():\n    import os  as o\n", "file": "tests/test_a.py"},
            {"name": "test_plain", "body": "def test_plain():\n    pass\n", "file": "tests/test_a.py"}
        ]}]"#,
    );

    harvest()
        .args(["normalize", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Normalized 1 of 2 tests, 0 skipped"));

    let normalized: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(data.path().join("dataset/python_tests_normalized.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(normalized[0]["tests"][0]["body"], "def test_alias():\n    import os as o\n");
    assert_eq!(normalized[0]["tests"][1]["body"], "def test_plain():\n    pass\n");
}

#[test]
fn test_normalize_requires_deduped_dataset() {
    let data = TempDir::new().unwrap();
    harvest()
        .args(["normalize", "--data-dir"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("python_tests_deduped.json"));
}
