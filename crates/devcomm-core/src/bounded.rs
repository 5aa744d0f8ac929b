//! Length-checked owned strings for paths and filters.

use std::fmt;
use std::ops::Deref;
use std::path::Path;

use crate::config::limits::MAX_STRING_SIZE;
use crate::error::{Error, Result};

/// A string no longer than [`MAX_STRING_SIZE`] characters.
///
/// Over-long input is rejected with [`Error::LengthExceeded`], never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundedString(String);

impl BoundedString {
    /// Check `value` against the limit. `what` names the value in the error.
    pub fn new(value: impl Into<String>, what: &'static str) -> Result<Self> {
        let value = value.into();
        let len = value.chars().count();
        if len > MAX_STRING_SIZE {
            return Err(Error::LengthExceeded {
                what,
                len,
                max: MAX_STRING_SIZE,
            });
        }
        Ok(Self(value))
    }

    /// Check a filesystem path. Non UTF-8 segments are counted lossily.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(path.to_string_lossy().into_owned(), "path")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for BoundedString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for BoundedString {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for BoundedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
