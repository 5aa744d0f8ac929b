//! Error types for the devcomm crate.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for devcomm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which address table a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommKind {
    /// External fieldbus device communication.
    Device,
    /// NC internal PLC communication.
    Plc,
}

impl fmt::Display for CommKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommKind::Device => write!(f, "device"),
            CommKind::Plc => write!(f, "plc"),
        }
    }
}

/// devcomm error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Mapping file does not exist.
    #[error("Mapping file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Mapping file exists but could not be read.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mapping line that does not fit the record schema.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Resolution attempted while the communication flag is off.
    #[error("{0} communication is disabled")]
    FeatureDisabled(CommKind),

    /// No mapping for the requested key.
    #[error("No address mapping for key: {0}")]
    NotFound(String),

    /// Path or filter longer than the configured maximum.
    #[error("{what} length {len} exceeds maximum of {max}")]
    LengthExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// Filter expression could not be interpreted.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build the error for a failed read of `path`, separating a missing file
    /// from other IO failures.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path)
        } else {
            Error::Io { path, source }
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(format!("TOML error: {}", e))
    }
}
