//! Address Swap Tests
//!
//! End-to-end tests from mapping files to swapped addresses:
//! - Loading counts and file order
//! - Case-insensitive resolution
//! - Last-write-wins on duplicate keys
//! - Communication flags
//! - Not-found results leaving tables intact

use devcomm_core::prelude::*;
use devcomm_core::{build_device_table, build_plc_table};
use std::fs;
use tempfile::TempDir;

const DEVICE_MAP: &str = "\
# mem_id,block,addr,dev_id,mem_type,target,desc
1,WORD,10,DEV1,INWORD,4000,spindle speed
1,WORD,11,DEV1,OUTWORD,4001,feed override
2,BIT,0,Dev2,InBit,100,door switch
";

const PLC_MAP: &str = "\
; machine,vendor,type,target,mem_id,block,addr,desc
M1,V1,WORD,100,2,WORDBLOCK,20,first
M1,V1,WORD,200,2,WORDBLOCK,21,second
M1,V1,BIT,X10,3,BITBLOCK,0,alarm
";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn loaded_resolver(dir: &TempDir) -> AddressResolver {
    let resolver = AddressResolver::new(DevCommConfig::default()).unwrap();
    resolver
        .load_device_mapping_file(write(dir, "device.map", DEVICE_MAP))
        .unwrap();
    resolver
        .load_plc_mapping_file(write(dir, "plc.map", PLC_MAP))
        .unwrap();
    resolver
}

#[test]
fn test_records_follow_file_order() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    let records = resolver.device_records();
    let targets: Vec<&str> = records.iter().map(|r| r.dev_target_addr.as_str()).collect();
    assert_eq!(targets, vec!["4000", "4001", "100"]);
    assert_eq!(resolver.plc_records().len(), 3);
}

#[test]
fn test_three_valid_one_short_line() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "device.map",
        "1,WORD,10,DEV1,INWORD,4000,a\n\
         1,WORD,11,DEV1,OUTWORD,4001,b\n\
         1,WORD,12,DEV3,INWORD\n\
         2,BIT,0,DEV2,INBIT,100,c\n",
    );
    let resolver = AddressResolver::new(DevCommConfig::default()).unwrap();
    let summary = resolver.load_device_mapping_file(&path).unwrap();

    assert_eq!(summary.loaded(), 3);
    assert_eq!(summary.skipped_count(), 1);
    assert_eq!(summary.skipped[0].line, 3);
}

#[test]
fn test_round_trip_device() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    let entry = resolver.resolve_device_address("DEV1:INWORD").unwrap().unwrap();
    assert_eq!(
        entry,
        DevCommAddrInfo {
            dev_id: "DEV1".to_string(),
            mem_type: "INWORD".to_string(),
            target_addr: "4000".to_string(),
            desc: "spindlespeed".to_string(),
        }
    );
}

#[test]
fn test_resolution_ignores_case() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    for filter in ["Dev2:InBit", "dev2:inbit", "DEV2:INBIT", "dev=DEV2&mem=inbit"] {
        let entry = resolver.resolve_device_address(filter).unwrap().unwrap();
        assert_eq!(entry.target_addr, "100", "filter {}", filter);
        // stored fields keep their original case
        assert_eq!(entry.dev_id, "Dev2");
    }

    let upper = resolver.resolve_plc_address("M1:V1:BIT", None).unwrap();
    let lower = resolver.resolve_plc_address("m1:v1:bit", None).unwrap();
    assert_eq!(upper, lower);
    assert!(upper.is_some());
}

#[test]
fn test_duplicate_plc_key_last_wins() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    let entry = resolver.resolve_plc_address("M1:V1:WORD", None).unwrap().unwrap();
    assert_eq!(entry.plc_target_addr, "200");
    assert_eq!(entry.plc_data_addr, "21");
    assert_eq!(resolver.stats().plc_entries, 2);
}

#[test]
fn test_table_size_bounded_by_records() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    let dev_records = resolver.device_records();
    let plc_records = resolver.plc_records();
    let dev_table = build_device_table(&dev_records, ':');
    let plc_table = build_plc_table(&plc_records, ':');

    assert_eq!(dev_table.len(), dev_records.len());
    assert!(plc_table.len() < plc_records.len());
    assert_eq!(dev_table, resolver.device_table());
}

#[test]
fn test_disabled_flag_always_fails() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);
    resolver.set_device_comm_flag(false);
    resolver.set_plc_comm_flag(false);

    for filter in ["DEV1:INWORD", "DEV9:NONE", ""] {
        let err = resolver.resolve_device_address(filter).unwrap_err();
        assert!(matches!(err, Error::FeatureDisabled(CommKind::Device)));
    }
    let err = resolver
        .resolve_plc_address("M1:V1:WORD", Some("200"))
        .unwrap_err();
    assert!(matches!(err, Error::FeatureDisabled(CommKind::Plc)));
}

#[test]
fn test_flags_from_config() {
    let config = DevCommConfig {
        plc_comm_enabled: false,
        ..DevCommConfig::default()
    };
    let resolver = AddressResolver::new(config).unwrap();

    assert!(resolver.device_comm_enabled());
    assert!(matches!(
        resolver.resolve_plc_address("M1:V1:WORD", None),
        Err(Error::FeatureDisabled(CommKind::Plc))
    ));
}

#[test]
fn test_unknown_key_leaves_table_unchanged() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);
    let before = resolver.device_table();

    assert!(resolver.resolve_device_address("DEV9:INWORD").unwrap().is_none());
    assert!(resolver.resolve_plc_address("M9:V1:WORD", None).unwrap().is_none());

    assert_eq!(resolver.device_table(), before);
    let entry = resolver.resolve_device_address("DEV1:INWORD").unwrap().unwrap();
    assert_eq!(entry.target_addr, "4000");
}

#[test]
fn test_tables_are_independent() {
    let dir = TempDir::new().unwrap();
    let resolver = AddressResolver::new(DevCommConfig::default()).unwrap();
    resolver
        .load_device_mapping_file(write(&dir, "device.map", DEVICE_MAP))
        .unwrap();

    // loading PLC data leaves the device table alone
    let before = resolver.device_table();
    resolver
        .load_plc_mapping_file(write(&dir, "plc.map", PLC_MAP))
        .unwrap();
    assert_eq!(resolver.device_table(), before);

    // a device-style filter is not a PLC key
    assert!(resolver.resolve_plc_address("DEV1:INWORD", None).is_err());
}

#[test]
fn test_returned_entries_are_copies() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);

    let mut entry = resolver.resolve_device_address("DEV1:INWORD").unwrap().unwrap();
    entry.target_addr = "9999".to_string();

    let again = resolver.resolve_device_address("DEV1:INWORD").unwrap().unwrap();
    assert_eq!(again.target_addr, "4000");
}

#[test]
fn test_over_long_filter_rejected() {
    let dir = TempDir::new().unwrap();
    let resolver = loaded_resolver(&dir);
    let filter = format!("{}:INWORD", "D".repeat(limits::MAX_STRING_SIZE));

    let err = resolver.resolve_device_address(&filter).unwrap_err();
    assert!(matches!(err, Error::LengthExceeded { .. }));
}

#[test]
fn test_combined_file_and_config_reload() {
    let dir = TempDir::new().unwrap();
    let combined = write(
        &dir,
        "memmap.txt",
        &format!("[DEVICE]\n{}\n[PLC]\n{}", DEVICE_MAP, PLC_MAP),
    );
    let config = DevCommConfig::from_toml_str(&format!(
        "mem_map_path = {:?}\nreload_policy = \"replace\"\n",
        combined.display().to_string()
    ))
    .unwrap();
    let resolver = AddressResolver::new(config).unwrap();

    let summary = resolver.reload().unwrap();
    assert_eq!(summary.device_loaded, 3);
    assert_eq!(summary.plc_loaded, 3);
    assert_eq!(summary.skipped_count(), 0);

    // replace policy: a second reload does not duplicate records
    resolver.reload().unwrap();
    assert_eq!(resolver.stats().device_records, 3);
}
