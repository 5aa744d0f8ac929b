//! Filter expressions accepted by the swap operations.
//!
//! A filter is a list of pieces joined by `&`. One piece may be positional,
//! with identifiers joined by the key separator; the others are
//! `name=value` pairs:
//!
//! ```text
//! DEV1:INWORD                       positional device filter
//! dev=DEV1&mem=INWORD&channel=1     named, plus a numeric constraint
//! M1:V1:WORD&machine=1              positional PLC filter plus a constraint
//! machine_id=M1&vendor=V1&type=WORD named PLC filter
//! ```
//!
//! Pairs that do not name an identifier must carry an integer value and
//! become [`DevCommFilterInfo`] constraints.

use crate::bounded::BoundedString;
use crate::config::defaults::FILTER_PAIR_SEPARATOR;
use crate::error::{Error, Result};
use crate::model::{DevCommFilterInfo, PlcCommAddrInfo};
use crate::parser::strip_whitespace;
use crate::table::{device_key, plc_key};

const DEVICE_ID_NAMES: &[&str] = &["dev", "device", "devid", "dev_id", "device_id"];
const MEM_TYPE_NAMES: &[&str] = &["mem", "memtype", "mem_type", "dev_mem_type"];
// `machine=<n>` stays free for the numeric machine selector
const MACHINE_NAMES: &[&str] = &["machine_id", "machineid", "mc"];
const VENDOR_NAMES: &[&str] = &["vendor", "vendorcode", "vendor_code"];
const DATA_TYPE_NAMES: &[&str] = &["type", "datatype", "data_type"];

/// Split a filter into identifier values (in `names` order) and constraints.
fn parse_identifiers<const N: usize>(
    expr: &str,
    sep: char,
    names: [&[&str]; N],
) -> Result<([String; N], Vec<DevCommFilterInfo>)> {
    let expr = BoundedString::new(expr, "filter")?;
    let mut slots: [Option<String>; N] = std::array::from_fn(|_| None);
    let mut constraints = Vec::new();
    let mut seen_positional = false;

    for piece in expr.split(FILTER_PAIR_SEPARATOR) {
        let piece = strip_whitespace(piece);
        if piece.is_empty() {
            continue;
        }

        if let Some((name, value)) = piece.split_once('=') {
            let name = name.to_ascii_lowercase();
            if let Some(slot) = names.iter().position(|aliases| aliases.contains(&name.as_str())) {
                if value.is_empty() {
                    return Err(Error::InvalidFilter(format!("empty value for {}", name)));
                }
                // the value becomes one key part
                if value.contains(sep) {
                    return Err(Error::InvalidFilter(format!(
                        "{} value {:?} contains the key separator {:?}",
                        name, value, sep
                    )));
                }
                if slots[slot].replace(value.to_string()).is_some() {
                    return Err(Error::InvalidFilter(format!("{} given more than once", name)));
                }
            } else {
                let value: i32 = value.parse().map_err(|_| {
                    Error::InvalidFilter(format!("{}={} is not a numeric filter", name, value))
                })?;
                constraints.push(DevCommFilterInfo::new(name, value));
            }
            continue;
        }

        if seen_positional {
            return Err(Error::InvalidFilter(format!(
                "more than one positional part in {:?}",
                expr.as_str()
            )));
        }
        seen_positional = true;

        let parts: Vec<&str> = piece.split(sep).collect();
        if parts.len() != N || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidFilter(format!(
                "expected {} parts separated by {:?}, got {:?}",
                N, sep, piece
            )));
        }
        for (slot, part) in slots.iter_mut().zip(parts) {
            if slot.replace(part.to_string()).is_some() {
                return Err(Error::InvalidFilter(format!(
                    "identifier given twice in {:?}",
                    expr.as_str()
                )));
            }
        }
    }

    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (i, slot) in slots.into_iter().enumerate() {
        values[i] = slot.ok_or_else(|| {
            Error::InvalidFilter(format!("missing {} in {:?}", names[i][0], expr.as_str()))
        })?;
    }
    Ok((values, constraints))
}

/// Parsed device swap filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    pub dev_id: String,
    pub mem_type: String,
    pub constraints: Vec<DevCommFilterInfo>,
}

impl DeviceFilter {
    pub fn parse(expr: &str, sep: char) -> Result<Self> {
        let ([dev_id, mem_type], constraints) =
            parse_identifiers(expr, sep, [DEVICE_ID_NAMES, MEM_TYPE_NAMES])?;
        Ok(Self {
            dev_id,
            mem_type,
            constraints,
        })
    }

    /// Table key, normalized the same way as at build time.
    pub fn key(&self, sep: char) -> String {
        device_key(&self.dev_id, &self.mem_type, sep)
    }
}

/// Parsed PLC swap filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlcFilter {
    pub machine_id: String,
    pub vendor_code: String,
    pub data_type: String,
    pub constraints: Vec<DevCommFilterInfo>,
}

impl PlcFilter {
    pub fn parse(expr: &str, sep: char) -> Result<Self> {
        let ([machine_id, vendor_code, data_type], constraints) =
            parse_identifiers(expr, sep, [MACHINE_NAMES, VENDOR_NAMES, DATA_TYPE_NAMES])?;
        Ok(Self {
            machine_id,
            vendor_code,
            data_type,
            constraints,
        })
    }

    pub fn key(&self, sep: char) -> String {
        plc_key(&self.machine_id, &self.vendor_code, &self.data_type, sep)
    }
}

/// Non-key field of a [`PlcCommAddrInfo`] usable in a secondary filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcField {
    MemId,
    MemBlockType,
    PlcDataAddr,
    TargetAddr,
    TargetEndAddr,
    Description,
}

impl PlcField {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "memid" | "mem_id" => Some(Self::MemId),
            "block" | "blocktype" | "mem_blk_type" => Some(Self::MemBlockType),
            "dataaddr" | "data_addr" | "plc_data_addr" => Some(Self::PlcDataAddr),
            "target" | "target_addr" | "plc_target_addr" => Some(Self::TargetAddr),
            "end" | "end_addr" | "plc_target_end_addr" => Some(Self::TargetEndAddr),
            "desc" | "description" => Some(Self::Description),
            _ => None,
        }
    }

    fn value<'a>(&self, entry: &'a PlcCommAddrInfo) -> &'a str {
        match self {
            Self::MemId => &entry.mem_id,
            Self::MemBlockType => &entry.mem_blk_type,
            Self::PlcDataAddr => &entry.plc_data_addr,
            Self::TargetAddr => &entry.plc_target_addr,
            Self::TargetEndAddr => &entry.plc_target_end_addr,
            Self::Description => &entry.desc,
        }
    }
}

/// Secondary PLC filter: exact equality on non-key fields.
///
/// `target=D100&block=WORDBLOCK`, or a bare `D100` for the target address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlcFieldFilter {
    pub conditions: Vec<(PlcField, String)>,
}

impl PlcFieldFilter {
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = BoundedString::new(payload, "filter")?;
        let mut conditions = Vec::new();
        for piece in payload.split(FILTER_PAIR_SEPARATOR) {
            let piece = strip_whitespace(piece);
            if piece.is_empty() {
                continue;
            }
            match piece.split_once('=') {
                Some((name, value)) => {
                    let field = PlcField::from_name(name).ok_or_else(|| {
                        Error::InvalidFilter(format!("unknown PLC field: {}", name))
                    })?;
                    conditions.push((field, value.to_string()));
                }
                None => conditions.push((PlcField::TargetAddr, piece)),
            }
        }
        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, entry: &PlcCommAddrInfo) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| field.value(entry) == value)
    }
}
