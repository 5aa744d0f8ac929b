//! Mapping records, translated address entries and the platform data type tags.
//!
//! ```text
//! mapping file line          record          address table entry
//! 1,WORD,10,DEV1,INWORD,...  ─→ DevMemInfo  ─→ DevCommAddrInfo
//! M1,V1,WORD,D100,2,...      ─→ PlcMemInfo  ─→ PlcCommAddrInfo
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of columns in a device mapping line.
pub const DEV_MEM_FIELDS: usize = 7;

/// Number of columns in a PLC mapping line.
pub const PLC_MEM_FIELDS: usize = 8;

/// One line of a device mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevMemInfo {
    /// Platform memory ID
    pub mem_id: String,
    /// Platform memory block mirroring the device memory
    pub mem_block: String,
    /// Data address inside the platform memory block
    pub data_address: String,
    pub dev_id: String,
    pub dev_mem_type: String,
    /// Address in the device's own memory
    pub dev_target_addr: String,
    pub description: String,
}

impl DevMemInfo {
    /// Build a record from the columns of one line, in file order.
    pub fn from_fields(fields: Vec<String>) -> Option<Self> {
        let [mem_id, mem_block, data_address, dev_id, dev_mem_type, dev_target_addr, description]: [String; DEV_MEM_FIELDS] =
            fields.try_into().ok()?;
        Some(Self {
            mem_id,
            mem_block,
            data_address,
            dev_id,
            dev_mem_type,
            dev_target_addr,
            description,
        })
    }
}

/// One line of an NC internal PLC mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcMemInfo {
    pub machine_id: String,
    /// NC/PLC vendor code
    pub vendor_code: String,
    pub data_type: String,
    /// Data address in the PLC
    pub plc_target_addr: String,
    /// Platform memory ID
    pub mem_id: String,
    pub mem_block_type: String,
    /// Data address inside the platform memory block
    pub data_address: String,
    pub description: String,
}

impl PlcMemInfo {
    /// Build a record from the columns of one line, in file order.
    pub fn from_fields(fields: Vec<String>) -> Option<Self> {
        let [machine_id, vendor_code, data_type, plc_target_addr, mem_id, mem_block_type, data_address, description]: [String; PLC_MEM_FIELDS] =
            fields.try_into().ok()?;
        Some(Self {
            machine_id,
            vendor_code,
            data_type,
            plc_target_addr,
            mem_id,
            mem_block_type,
            data_address,
            description,
        })
    }
}

/// Translated device address returned by a device swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCommAddrInfo {
    pub dev_id: String,
    pub mem_type: String,
    pub target_addr: String,
    pub desc: String,
}

impl From<&DevMemInfo> for DevCommAddrInfo {
    fn from(record: &DevMemInfo) -> Self {
        Self {
            dev_id: record.dev_id.clone(),
            mem_type: record.dev_mem_type.clone(),
            target_addr: record.dev_target_addr.clone(),
            desc: record.description.clone(),
        }
    }
}

/// Translated PLC address returned by a PLC swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcCommAddrInfo {
    pub mem_id: String,
    pub mem_blk_type: String,
    pub plc_data_addr: String,
    pub machine_id: String,
    pub vendor_code: String,
    pub target_data_type: String,
    pub plc_target_addr: String,
    /// Copied from the target address; ranges are not expanded here.
    pub plc_target_end_addr: String,
    pub desc: String,
}

impl From<&PlcMemInfo> for PlcCommAddrInfo {
    fn from(record: &PlcMemInfo) -> Self {
        Self {
            mem_id: record.mem_id.clone(),
            mem_blk_type: record.mem_block_type.clone(),
            plc_data_addr: record.data_address.clone(),
            machine_id: record.machine_id.clone(),
            vendor_code: record.vendor_code.clone(),
            target_data_type: record.data_type.clone(),
            plc_target_addr: record.plc_target_addr.clone(),
            plc_target_end_addr: record.plc_target_addr.clone(),
            desc: record.description.clone(),
        }
    }
}

/// Named numeric criterion narrowing a swap, e.g. `machine=1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevCommFilterInfo {
    pub filter_name: String,
    pub filter_value: i32,
}

impl DevCommFilterInfo {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            filter_name: name.into(),
            filter_value: value,
        }
    }
}

/// Width/sign tags of platform memory blocks.
///
/// The `In*` variants are the signed ("in") forms. Discriminants match the
/// numeric codes used by platform callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    InBitBlock = 1,
    BitBlock = 2,
    InByteBlock = 3,
    ByteBlock = 4,
    InWordBlock = 5,
    WordBlock = 6,
    InDwordBlock = 7,
    DwordBlock = 8,
    InQwordBlock = 9,
    QwordBlock = 10,
}

impl DataType {
    pub const ALL: [DataType; 10] = [
        Self::InBitBlock,
        Self::BitBlock,
        Self::InByteBlock,
        Self::ByteBlock,
        Self::InWordBlock,
        Self::WordBlock,
        Self::InDwordBlock,
        Self::DwordBlock,
        Self::InQwordBlock,
        Self::QwordBlock,
    ];

    /// Numeric platform code (1..=10).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Width of one element in bits.
    pub fn bit_width(self) -> u32 {
        match self {
            Self::InBitBlock | Self::BitBlock => 1,
            Self::InByteBlock | Self::ByteBlock => 8,
            Self::InWordBlock | Self::WordBlock => 16,
            Self::InDwordBlock | Self::DwordBlock => 32,
            Self::InQwordBlock | Self::QwordBlock => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::InBitBlock
                | Self::InByteBlock
                | Self::InWordBlock
                | Self::InDwordBlock
                | Self::InQwordBlock
        )
    }

    /// Canonical tag as written in mapping files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InBitBlock => "INBITBLOCK",
            Self::BitBlock => "BITBLOCK",
            Self::InByteBlock => "INBYTEBLOCK",
            Self::ByteBlock => "BYTEBLOCK",
            Self::InWordBlock => "INWORDBLOCK",
            Self::WordBlock => "WORDBLOCK",
            Self::InDwordBlock => "INDWORDBLOCK",
            Self::DwordBlock => "DWORDBLOCK",
            Self::InQwordBlock => "INQWORDBLOCK",
            Self::QwordBlock => "QWORDBLOCK",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    /// Accepts `INWORDBLOCK`, `InWord`, `word`, or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if let Ok(code) = upper.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown data type code: {}", code));
        }
        let base = upper.strip_suffix("BLOCK").unwrap_or(&upper);
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().strip_suffix("BLOCK") == Some(base))
            .ok_or_else(|| format!("unknown data type: {}", s))
    }
}
