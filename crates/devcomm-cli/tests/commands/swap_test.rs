//! Tests for the `swap-dev` and `swap-plc` commands.

use super::{write_map, DEVICE_MAP, PLC_MAP};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test swap-dev resolves a positional filter.
#[test]
fn test_swap_dev_found() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("swap-dev").arg("dev1:inword").arg("--device-map").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("target:  4000"))
        .stdout(predicate::str::contains("desc:    spindlespeed"));
}

/// Test swap-dev JSON output carries the entry fields.
#[test]
fn test_swap_dev_json() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("--json")
        .arg("swap-dev")
        .arg("dev=DEV2&mem=INBIT")
        .arg("-d")
        .arg(&path);

    let output = cmd.assert().success().get_output().stdout.clone();
    let entry: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(entry["dev_id"], "DEV2");
    assert_eq!(entry["target_addr"], "100");
}

/// Test swap-dev fails for an unknown key.
#[test]
fn test_swap_dev_not_found() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("swap-dev").arg("DEV9:INWORD").arg("-d").arg(&path);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("DEV9:INWORD"));
}

/// Test swap-dev honours the disabled flag from the environment.
#[test]
fn test_swap_dev_disabled() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.env("DEVCOMM_DEVICE_COMM", "false")
        .arg("swap-dev")
        .arg("DEV1:INWORD")
        .arg("-d")
        .arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("device communication is disabled"));
}

/// Test swap-dev with an active filter list that rejects the constraint.
#[test]
fn test_swap_dev_filter_info_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "device.map", DEVICE_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("swap-dev")
        .arg("DEV1:INWORD&channel=2")
        .arg("-d")
        .arg(&path)
        .arg("--filter-info")
        .arg("channel=1");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No address mapping for key"))
        .stderr(predicate::str::contains("DEV1:INWORD&channel=2"));
}

/// Test swap-dev rejects a malformed --filter-info value.
#[test]
fn test_swap_dev_bad_filter_info() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("swap-dev")
        .arg("DEV1:INWORD")
        .arg("--filter-info")
        .arg("channel");

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("name=value"));
}

/// Test swap-plc picks the last duplicate and the end address.
#[test]
fn test_swap_plc_found() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "plc.map", PLC_MAP);

    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.arg("swap-plc").arg("M1:V1:WORD").arg("--plc-map").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("target:   D200"))
        .stdout(predicate::str::contains("end:      D200"))
        .stdout(predicate::str::contains("memory:   2 WORDBLOCK @ 21"));
}

/// Test swap-plc secondary filter on non-key fields.
#[test]
fn test_swap_plc_extra_filter() {
    let dir = TempDir::new().unwrap();
    let path = write_map(&dir, "plc.map", PLC_MAP);

    let mut ok = Command::cargo_bin("devcomm").unwrap();
    ok.arg("swap-plc")
        .arg("M1:V1:BIT")
        .arg("-p")
        .arg(&path)
        .arg("--extra")
        .arg("block=BITBLOCK");
    ok.assert()
        .success()
        .stdout(predicate::str::contains("target:   X10"));

    let mut miss = Command::cargo_bin("devcomm").unwrap();
    miss.arg("swap-plc")
        .arg("M1:V1:BIT")
        .arg("-p")
        .arg(&path)
        .arg("--extra")
        .arg("X11");
    miss.assert().failure().code(1);
}

/// Test swap-plc without any mapping file configured.
#[test]
fn test_swap_plc_without_map() {
    let mut cmd = Command::cargo_bin("devcomm").unwrap();
    cmd.env_remove("DEVCOMM_PLC_MAP")
        .env_remove("DEVCOMM_DEVICE_MAP")
        .env_remove("DEVCOMM_MAP_FILE")
        .arg("swap-plc")
        .arg("M1:V1:WORD");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load mapping files"));
}
