//! Mapping file loader.
//!
//! Reads device and PLC mapping files line by line into typed records.
//! A file is read completely before any record is produced, so an IO failure
//! never leaves a partial result behind. Malformed lines are skipped and
//! reported in the [`LoadReport`], they do not abort the load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::bounded::BoundedString;
use crate::config::DevCommConfig;
use crate::error::{CommKind, Error, Result};
use crate::model::{DevMemInfo, PlcMemInfo, DEV_MEM_FIELDS, PLC_MEM_FIELDS};
use crate::parser::{classify_line, split, split_record, LineKind};
use crate::util::is_only_number;

/// A line that was not turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// Outcome of loading one file for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport<T> {
    pub path: PathBuf,
    /// Records in file order.
    pub records: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> LoadReport<T> {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn loaded(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn skip(&mut self, err: Error) {
        let (line, reason) = match err {
            Error::MalformedRecord { line, reason } => (line, reason),
            other => (0, other.to_string()),
        };
        warn!(
            category = "devcomm",
            path = %self.path.display(),
            line,
            reason = %reason,
            "Skipping mapping line"
        );
        self.skipped.push(SkippedLine { line, reason });
    }
}

/// Outcome of loading a combined mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemMapReport {
    pub device: LoadReport<DevMemInfo>,
    pub plc: LoadReport<PlcMemInfo>,
    /// Lines that could not be assigned to either schema.
    pub skipped: Vec<SkippedLine>,
    /// The file addressed the device schema (forced mode, a device section
    /// or a device-shaped line), even if no record survived.
    pub saw_device: bool,
    pub saw_plc: bool,
}

impl MemMapReport {
    pub fn loaded(&self) -> usize {
        self.device.loaded() + self.plc.loaded()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len() + self.device.skipped_count() + self.plc.skipped_count()
    }
}

/// How [`load_mem_mapping_file`] interprets a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Every record line is a device mapping.
    Device,
    /// Every record line is a PLC mapping.
    Plc,
    /// `[DEVICE]` / `[PLC]` sections choose the schema; lines before any
    /// section are classified by their field count.
    #[default]
    Auto,
}

/// A record that can be parsed from one mapping line.
pub trait FromMappingLine: Sized {
    const KIND: CommKind;
    const FIELDS: usize;

    /// Parse cleaned fields. `line` is only used for error reporting.
    fn from_mapping_fields(fields: Vec<String>, line: usize) -> Result<Self>;

    /// Split and parse a raw line.
    fn parse_line(raw: &str, delimiter: char, line: usize) -> Result<Self> {
        let fields = split_record(raw, delimiter, Self::FIELDS)
            .map_err(|reason| Error::MalformedRecord { line, reason })?;
        Self::from_mapping_fields(fields, line)
    }
}

fn require_present(value: &str, name: &str, line: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MalformedRecord {
            line,
            reason: format!("{} is empty", name),
        });
    }
    Ok(())
}

fn require_number(value: &str, name: &str, line: usize) -> Result<()> {
    if !is_only_number(value) {
        return Err(Error::MalformedRecord {
            line,
            reason: format!("{} is not numeric: {:?}", name, value),
        });
    }
    Ok(())
}

impl FromMappingLine for DevMemInfo {
    const KIND: CommKind = CommKind::Device;
    const FIELDS: usize = DEV_MEM_FIELDS;

    fn from_mapping_fields(fields: Vec<String>, line: usize) -> Result<Self> {
        let record = DevMemInfo::from_fields(fields).ok_or_else(|| Error::MalformedRecord {
            line,
            reason: format!("expected {} fields", DEV_MEM_FIELDS),
        })?;
        require_present(&record.dev_id, "device ID", line)?;
        require_present(&record.dev_mem_type, "device memory type", line)?;
        require_number(&record.data_address, "platform data address", line)?;
        Ok(record)
    }
}

impl FromMappingLine for PlcMemInfo {
    const KIND: CommKind = CommKind::Plc;
    const FIELDS: usize = PLC_MEM_FIELDS;

    fn from_mapping_fields(fields: Vec<String>, line: usize) -> Result<Self> {
        let record = PlcMemInfo::from_fields(fields).ok_or_else(|| Error::MalformedRecord {
            line,
            reason: format!("expected {} fields", PLC_MEM_FIELDS),
        })?;
        require_present(&record.machine_id, "machine ID", line)?;
        require_present(&record.vendor_code, "vendor code", line)?;
        require_present(&record.data_type, "data type", line)?;
        require_number(&record.data_address, "platform data address", line)?;
        Ok(record)
    }
}

/// One line of a mapping file, or the reason it could not be decoded.
type RawLine = std::result::Result<String, String>;

/// Read every line of `path`. Missing files map to [`Error::FileNotFound`].
///
/// Only IO failures abort; a line that is not valid UTF-8 comes back as
/// `Err` so the caller can skip it.
fn read_lines(path: &Path) -> Result<Vec<RawLine>> {
    BoundedString::from_path(path)?;
    let bytes = fs::read(path).map_err(|e| Error::from_io(path, e))?;
    let mut lines: Vec<RawLine> = bytes
        .split(|b| *b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r".as_slice()).unwrap_or(line);
            std::str::from_utf8(line)
                .map(str::to_string)
                .map_err(|e| format!("line is not valid UTF-8: {}", e))
        })
        .collect();
    // a final newline does not start another line
    if matches!(lines.last(), Some(Ok(last)) if last.is_empty()) {
        lines.pop();
    }
    Ok(lines)
}

fn load_records<T: FromMappingLine>(path: &Path, config: &DevCommConfig) -> Result<LoadReport<T>> {
    let lines = read_lines(path)?;
    let mut report = LoadReport::new(path);

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let raw = match raw {
            Ok(raw) => raw,
            Err(reason) => {
                report.skip(Error::MalformedRecord {
                    line: line_no,
                    reason: reason.clone(),
                });
                continue;
            }
        };
        match classify_line(raw, config.comment_markers.as_slice()) {
            LineKind::Blank | LineKind::Comment => {}
            LineKind::Section(name) => report.skip(Error::MalformedRecord {
                line: line_no,
                reason: format!("unexpected section header [{}] in {} mapping file", name, T::KIND),
            }),
            LineKind::Record(text) => match T::parse_line(text, config.field_delimiter, line_no) {
                Ok(record) => report.records.push(record),
                Err(e) => report.skip(e),
            },
        }
    }

    info!(
        category = "devcomm",
        kind = %T::KIND,
        path = %path.display(),
        loaded = report.loaded(),
        skipped = report.skipped_count(),
        "Loaded mapping file"
    );
    Ok(report)
}

/// Load a device mapping file.
pub fn load_device_mapping_file(
    path: impl AsRef<Path>,
    config: &DevCommConfig,
) -> Result<LoadReport<DevMemInfo>> {
    load_records(path.as_ref(), config)
}

/// Load an NC internal PLC mapping file.
pub fn load_plc_mapping_file(
    path: impl AsRef<Path>,
    config: &DevCommConfig,
) -> Result<LoadReport<PlcMemInfo>> {
    load_records(path.as_ref(), config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Unassigned,
    Known(CommKind),
    Unknown,
}

fn section_kind(name: &str) -> Option<CommKind> {
    match name.to_ascii_uppercase().as_str() {
        "DEVICE" | "DEV" | "FIELDBUS" => Some(CommKind::Device),
        "PLC" | "NCPLC" => Some(CommKind::Plc),
        _ => None,
    }
}

/// Load a mapping file holding device records, PLC records, or both.
pub fn load_mem_mapping_file(
    path: impl AsRef<Path>,
    mode: LoadMode,
    config: &DevCommConfig,
) -> Result<MemMapReport> {
    let path = path.as_ref();
    match mode {
        LoadMode::Device => Ok(MemMapReport {
            device: load_device_mapping_file(path, config)?,
            plc: LoadReport::new(path),
            skipped: Vec::new(),
            saw_device: true,
            saw_plc: false,
        }),
        LoadMode::Plc => Ok(MemMapReport {
            device: LoadReport::new(path),
            plc: load_plc_mapping_file(path, config)?,
            skipped: Vec::new(),
            saw_device: false,
            saw_plc: true,
        }),
        LoadMode::Auto => load_combined(path, config),
    }
}

fn load_combined(path: &Path, config: &DevCommConfig) -> Result<MemMapReport> {
    let lines = read_lines(path)?;
    let mut device = LoadReport::new(path);
    let mut plc = LoadReport::new(path);
    let mut unassigned: LoadReport<()> = LoadReport::new(path);
    let mut section = Section::Unassigned;
    let mut saw_device = false;
    let mut saw_plc = false;
    let mut mark_seen = |kind: CommKind| match kind {
        CommKind::Device => saw_device = true,
        CommKind::Plc => saw_plc = true,
    };

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let raw = match raw {
            Ok(raw) => raw,
            Err(reason) => {
                let err = Error::MalformedRecord {
                    line: line_no,
                    reason: reason.clone(),
                };
                match section {
                    Section::Known(CommKind::Device) => device.skip(err),
                    Section::Known(CommKind::Plc) => plc.skip(err),
                    _ => unassigned.skip(err),
                }
                continue;
            }
        };
        let text = match classify_line(raw, config.comment_markers.as_slice()) {
            LineKind::Blank | LineKind::Comment => continue,
            LineKind::Section(name) => {
                section = match section_kind(name) {
                    Some(kind) => {
                        mark_seen(kind);
                        Section::Known(kind)
                    }
                    None => {
                        unassigned.skip(Error::MalformedRecord {
                            line: line_no,
                            reason: format!("unknown section [{}]", name),
                        });
                        Section::Unknown
                    }
                };
                debug!(category = "devcomm", line = line_no, section = ?section, "Mapping section");
                continue;
            }
            LineKind::Record(text) => text,
        };

        let kind = match section {
            Section::Known(kind) => kind,
            Section::Unknown => {
                unassigned.skip(Error::MalformedRecord {
                    line: line_no,
                    reason: "record inside unknown section".to_string(),
                });
                continue;
            }
            Section::Unassigned => match split(text, config.field_delimiter).len() {
                DEV_MEM_FIELDS => {
                    mark_seen(CommKind::Device);
                    CommKind::Device
                }
                PLC_MEM_FIELDS => {
                    mark_seen(CommKind::Plc);
                    CommKind::Plc
                }
                n => {
                    unassigned.skip(Error::MalformedRecord {
                        line: line_no,
                        reason: format!(
                            "cannot infer record kind from {} fields (device {}, plc {})",
                            n, DEV_MEM_FIELDS, PLC_MEM_FIELDS
                        ),
                    });
                    continue;
                }
            },
        };

        match kind {
            CommKind::Device => match DevMemInfo::parse_line(text, config.field_delimiter, line_no) {
                Ok(record) => device.records.push(record),
                Err(e) => device.skip(e),
            },
            CommKind::Plc => match PlcMemInfo::parse_line(text, config.field_delimiter, line_no) {
                Ok(record) => plc.records.push(record),
                Err(e) => plc.skip(e),
            },
        }
    }

    let report = MemMapReport {
        device,
        plc,
        skipped: unassigned.skipped,
        saw_device,
        saw_plc,
    };
    info!(
        category = "devcomm",
        path = %path.display(),
        device = report.device.loaded(),
        plc = report.plc.loaded(),
        skipped = report.skipped_count(),
        "Loaded combined mapping file"
    );
    Ok(report)
}
