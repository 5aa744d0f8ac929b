//! Tests for the `table` command.

use super::{write_map, DEVICE_MAP, PLC_MAP};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test table lists normalized keys for both tables.
#[test]
fn test_table_lists_keys() {
    let dir = TempDir::new().unwrap();
    let device = write_map(&dir, "device.map", DEVICE_MAP);
    let plc = write_map(&dir, "plc.map", PLC_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("table").arg("-d").arg(&device).arg("-p").arg(&plc);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Device table (3 keys)"))
        .stdout(predicate::str::contains("dev1:inword"))
        .stdout(predicate::str::contains("PLC table (2 keys)"))
        .stdout(predicate::str::contains("m1:v1:bit"));
}

/// Test table JSON output is sorted.
#[test]
fn test_table_json() {
    let dir = TempDir::new().unwrap();
    let device = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("--json").arg("table").arg("--device-map").arg(&device);

    let output = cmd.assert().success().get_output().stdout.clone();
    let keys: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        keys["device"],
        serde_json::json!(["dev1:inword", "dev1:outword", "dev2:inbit"])
    );
    assert_eq!(keys["plc"], serde_json::json!([]));
}

/// Test table reads paths from a config file.
#[test]
fn test_table_from_config() {
    let dir = TempDir::new().unwrap();
    let combined = write_map(
        &dir,
        "memmap.txt",
        &format!("[DEVICE]\n{}[PLC]\n{}", DEVICE_MAP, PLC_MAP),
    );
    let config = write_map(
        &dir,
        "devcomm.toml",
        &format!("mem_map_path = {:?}\n", combined.display().to_string()),
    );

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("--config").arg(&config).arg("table");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Device table (3 keys)"))
        .stdout(predicate::str::contains("PLC table (2 keys)"));
}
