//! Tests for the `check` command.

use super::{write_map, DEVICE_MAP, PLC_MAP};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test check requires a file argument.
#[test]
fn test_check_requires_file() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"))
        .stderr(predicate::str::contains("<FILE>"));
}

/// Test check reports loaded and skipped lines of a device file.
#[test]
fn test_check_device_file() {
    let dir = TempDir::new().unwrap();
    let path = write_map(
        &dir,
        "device.map",
        &format!("{}1,WORD,12,DEV3,INWORD\n", DEVICE_MAP),
    );

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("check").arg(&path).arg("--mode").arg("device");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("device records: 3"))
        .stdout(predicate::str::contains("skipped lines:  1"))
        .stdout(predicate::str::contains("line 5"));
}

/// Test check on a combined file in auto mode with JSON output.
#[test]
fn test_check_combined_json() {
    let dir = TempDir::new().unwrap();
    let path = write_map(
        &dir,
        "memmap.txt",
        &format!("[DEVICE]\n{}[PLC]\n{}", DEVICE_MAP, PLC_MAP),
    );

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("--json").arg("check").arg(&path);

    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["device_loaded"], 3);
    assert_eq!(summary["plc_loaded"], 3);
}

/// Test check on a file that does not exist.
#[test]
fn test_check_missing_file() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("check").arg("/nonexistent/device.map");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

/// Test check rejects an unknown mode.
#[test]
fn test_check_invalid_mode() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("check").arg("device.map").arg("--mode").arg("fieldbus");

    cmd.assert().failure().code(2);
}
