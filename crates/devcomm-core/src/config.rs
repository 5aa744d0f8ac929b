//! Configuration for mapping file ingestion and address resolution.
//!
//! Defaults live in small constant modules so the CLI and tests share one
//! source. [`DevCommConfig`] can be loaded from TOML and then overridden by
//! environment variables:
//!
//! ```toml
//! field_delimiter = ","
//! key_separator = ":"
//! device_comm_enabled = true
//! plc_comm_enabled = true
//! reload_policy = "replace"
//! device_map_path = "maps/device.map"
//! plc_map_path = "maps/plc.map"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};

/// Length limits.
pub mod limits {
    /// Maximum length of a path or filter string.
    pub const MAX_STRING_SIZE: usize = 1024;
}

/// Default parsing constants.
pub mod defaults {
    /// Field delimiter inside a mapping line.
    pub const FIELD_DELIMITER: char = ',';
    /// Separator between key parts, also used by positional filters.
    pub const KEY_SEPARATOR: char = ':';
    /// Separator between `name=value` pairs in a filter.
    pub const FILTER_PAIR_SEPARATOR: char = '&';
    /// Line prefixes that mark a comment.
    pub const COMMENT_MARKERS: &[&str] = &["#", ";", "//"];
}

/// Environment variable names.
pub mod env_vars {
    pub const DEVICE_MAP: &str = "DEVCOMM_DEVICE_MAP";
    pub const PLC_MAP: &str = "DEVCOMM_PLC_MAP";
    pub const MAP_FILE: &str = "DEVCOMM_MAP_FILE";
    pub const DELIMITER: &str = "DEVCOMM_DELIMITER";
    pub const DEVICE_COMM: &str = "DEVCOMM_DEVICE_COMM";
    pub const PLC_COMM: &str = "DEVCOMM_PLC_COMM";

    /// Read a boolean switch such as `DEVCOMM_PLC_COMM=false`.
    pub fn flag(name: &str) -> Option<bool> {
        std::env::var(name)
            .ok()
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "false" | "off" | "no" => Some(false),
                _ => None,
            })
    }

    /// Read a single-character setting such as the field delimiter.
    pub fn single_char(name: &str) -> Option<char> {
        let value = std::env::var(name).ok()?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Read a path setting.
    pub fn path(name: &str) -> Option<std::path::PathBuf> {
        std::env::var_os(name)
            .filter(|v| !v.is_empty())
            .map(std::path::PathBuf::from)
    }
}

/// What happens to previously loaded records when a file is loaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Clear the record list of that kind, then rebuild the table.
    #[default]
    Replace,
    /// Keep earlier records and add the new ones.
    Append,
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevCommConfig {
    pub field_delimiter: char,
    pub key_separator: char,
    pub comment_markers: Vec<String>,
    pub device_comm_enabled: bool,
    pub plc_comm_enabled: bool,
    pub reload_policy: ReloadPolicy,
    pub device_map_path: Option<PathBuf>,
    pub plc_map_path: Option<PathBuf>,
    /// Combined mapping file with `[DEVICE]` / `[PLC]` sections.
    pub mem_map_path: Option<PathBuf>,
}

impl Default for DevCommConfig {
    fn default() -> Self {
        Self {
            field_delimiter: defaults::FIELD_DELIMITER,
            key_separator: defaults::KEY_SEPARATOR,
            comment_markers: defaults::COMMENT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            device_comm_enabled: true,
            plc_comm_enabled: true,
            reload_policy: ReloadPolicy::Replace,
            device_map_path: None,
            plc_map_path: None,
            mem_map_path: None,
        }
    }
}

impl DevCommConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DevCommConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        info!(category = "config", path = %path.display(), "Loading devcomm config");
        Self::from_toml_str(&content)
    }

    /// Apply `DEVCOMM_*` environment variables on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = env_vars::path(env_vars::DEVICE_MAP) {
            self.device_map_path = Some(path);
        }
        if let Some(path) = env_vars::path(env_vars::PLC_MAP) {
            self.plc_map_path = Some(path);
        }
        if let Some(path) = env_vars::path(env_vars::MAP_FILE) {
            self.mem_map_path = Some(path);
        }
        if let Some(c) = env_vars::single_char(env_vars::DELIMITER) {
            self.field_delimiter = c;
        }
        if let Some(on) = env_vars::flag(env_vars::DEVICE_COMM) {
            self.device_comm_enabled = on;
        }
        if let Some(on) = env_vars::flag(env_vars::PLC_COMM) {
            self.plc_comm_enabled = on;
        }
        self
    }

    /// Reject settings that would make keys or lines ambiguous.
    pub fn validate(&self) -> Result<()> {
        for (name, c) in [
            ("field_delimiter", self.field_delimiter),
            ("key_separator", self.key_separator),
        ] {
            if c.is_whitespace() || c.is_control() {
                return Err(Error::Config(format!(
                    "{} must be a visible character, got {:?}",
                    name, c
                )));
            }
        }
        if self.key_separator == defaults::FILTER_PAIR_SEPARATOR || self.key_separator == '=' {
            return Err(Error::Config(format!(
                "key_separator {:?} collides with filter syntax",
                self.key_separator
            )));
        }
        if self.comment_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::Config("comment markers must not be empty".to_string()));
        }
        Ok(())
    }
}
