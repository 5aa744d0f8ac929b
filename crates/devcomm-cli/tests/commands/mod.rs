//! Command-specific CLI tests.

mod check_test;
mod data_types_test;
mod swap_test;
mod table_test;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DEVICE_MAP: &str = "\
# mem_id,block,addr,dev_id,mem_type,target,desc
1,WORD,10,DEV1,INWORD,4000,spindle speed
1,WORD,11,DEV1,OUTWORD,4001,feed override
2,BIT,0,DEV2,INBIT,100,door switch
";

pub const PLC_MAP: &str = "\
; machine,vendor,type,target,mem_id,block,addr,desc
M1,V1,WORD,D100,2,WORDBLOCK,20,first
M1,V1,WORD,D200,2,WORDBLOCK,21,second
M1,V1,BIT,X10,3,BITBLOCK,0,alarm
";

/// Write a mapping file into `dir` and return its path.
pub fn write_map(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}
