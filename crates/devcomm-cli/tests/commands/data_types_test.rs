//! Tests for the `data-types` command.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test data-types lists every tag.
#[test]
fn test_data_types_text() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("data-types");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("INWORDBLOCK"))
        .stdout(predicate::str::contains("unsigned"));
}

/// Test data-types JSON has one row per code.
#[test]
fn test_data_types_json() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("--json").arg("data-types");

    let output = cmd.assert().success().get_output().stdout.clone();
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output).unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["code"], 1);
    assert!(rows.iter().all(|r| r["tag"].as_str().is_some()));
}
