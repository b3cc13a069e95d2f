//! Integration tests for the leadqual binary
//!
//! Only commands that never reach the LLM service are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config, .env and database
fn leadqual_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("leadqual").unwrap();
    cmd.current_dir(dir.path())
        .env("LEADQUAL_CONFIG", dir.path().join("config.yml"))
        .env("LEADQUAL_DB", dir.path().join("leads.sqlite"))
        .env("LEADQUAL_LLM_URL", "http://127.0.0.1:9")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("agent"));
}

#[test]
fn test_status_empty_store() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents:       0"))
        .stdout(predicate::str::contains("leads-demo"));
}

#[test]
fn test_status_json() {
    let dir = TempDir::new().unwrap();
    let output = leadqual_cmd(&dir)
        .args(["--format", "json", "status"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["documents"], 0);
    assert_eq!(json["max_candidates"], 3);
}

#[test]
fn test_delete_empty_store() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 document(s)"));
}

#[test]
fn test_query_empty_description() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .arg("query")
        .write_stdin("   \n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot be empty"));
}

#[test]
fn test_query_missing_product_file() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .args(["query", "--product", "missing.md", "buyer at Acme"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("product description"));
}

#[test]
fn test_ingest_missing_path() {
    let dir = TempDir::new().unwrap();
    leadqual_cmd(&dir)
        .args(["ingest", "no-such-leads.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no such file or directory"));
}
