//! Address resolver.
//!
//! [`AddressResolver`] owns the loaded record lists, both address tables,
//! the communication flags and the active filter list. Loads take the write
//! lock only after the file has been parsed; swaps take the read lock, so a
//! rebuild never interleaves with a lookup.
//!
//! ```rust,no_run
//! use devcomm_core::{AddressResolver, DevCommConfig};
//!
//! let resolver = AddressResolver::new(DevCommConfig::default())?;
//! resolver.load_device_mapping_file("maps/device.map")?;
//! if let Some(addr) = resolver.resolve_device_address("DEV1:INWORD")? {
//!     println!("target {}", addr.target_addr);
//! }
//! # Ok::<(), devcomm_core::Error>(())
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bounded::BoundedString;
use crate::config::{DevCommConfig, ReloadPolicy};
use crate::error::{CommKind, Error, Result};
use crate::filter::{DeviceFilter, PlcFieldFilter, PlcFilter};
use crate::loader::{self, LoadMode, SkippedLine};
use crate::model::{DevCommAddrInfo, DevCommFilterInfo, DevMemInfo, PlcCommAddrInfo, PlcMemInfo};
use crate::table::{build_device_table, build_plc_table, DeviceAddressTable, PlcAddressTable};
use crate::util::matches_filter_list;

/// Counts reported after a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub paths: Vec<PathBuf>,
    pub device_loaded: usize,
    pub plc_loaded: usize,
    pub skipped: Vec<SkippedLine>,
}

impl LoadSummary {
    pub fn loaded(&self) -> usize {
        self.device_loaded + self.plc_loaded
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Snapshot of resolver state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStats {
    pub device_records: usize,
    pub plc_records: usize,
    pub device_entries: usize,
    pub plc_entries: usize,
    pub device_comm_enabled: bool,
    pub plc_comm_enabled: bool,
    pub comm_filters: Vec<DevCommFilterInfo>,
}

/// Records parsed from files but not yet committed to the resolver.
#[derive(Default)]
struct PendingLoad {
    summary: LoadSummary,
    device: Option<Vec<DevMemInfo>>,
    plc: Option<Vec<PlcMemInfo>>,
}

impl PendingLoad {
    fn note_path(&mut self, path: &Path) {
        if !self.summary.paths.iter().any(|p| p == path) {
            self.summary.paths.push(path.to_path_buf());
        }
    }

    fn add_device(&mut self, path: &Path, records: Vec<DevMemInfo>, skipped: Vec<SkippedLine>) {
        self.note_path(path);
        self.summary.device_loaded += records.len();
        self.summary.skipped.extend(skipped);
        self.device.get_or_insert_with(Vec::new).extend(records);
    }

    fn add_plc(&mut self, path: &Path, records: Vec<PlcMemInfo>, skipped: Vec<SkippedLine>) {
        self.note_path(path);
        self.summary.plc_loaded += records.len();
        self.summary.skipped.extend(skipped);
        self.plc.get_or_insert_with(Vec::new).extend(records);
    }
}

#[derive(Debug, Default)]
struct ResolverState {
    config: DevCommConfig,
    dev_records: Vec<DevMemInfo>,
    plc_records: Vec<PlcMemInfo>,
    dev_table: DeviceAddressTable,
    plc_table: PlcAddressTable,
    comm_filters: Vec<DevCommFilterInfo>,
}

impl ResolverState {
    /// Merge parsed records according to the reload policy and rebuild the
    /// affected tables from scratch.
    fn commit(&mut self, pending: PendingLoad) {
        let sep = self.config.key_separator;
        let replace = self.config.reload_policy == ReloadPolicy::Replace;

        if let Some(records) = pending.device {
            if replace {
                self.dev_records.clear();
            }
            self.dev_records.extend(records);
            self.dev_table = build_device_table(&self.dev_records, sep);
            info!(
                category = "devcomm",
                records = self.dev_records.len(),
                entries = self.dev_table.len(),
                "Rebuilt device address table"
            );
        }
        if let Some(records) = pending.plc {
            if replace {
                self.plc_records.clear();
            }
            self.plc_records.extend(records);
            self.plc_table = build_plc_table(&self.plc_records, sep);
            info!(
                category = "devcomm",
                records = self.plc_records.len(),
                entries = self.plc_table.len(),
                "Rebuilt PLC address table"
            );
        }
    }
}

/// Translates device and PLC memory references into mapped addresses.
#[derive(Debug, Default)]
pub struct AddressResolver {
    state: RwLock<ResolverState>,
}

impl AddressResolver {
    /// Create an empty resolver. Flags start as configured.
    pub fn new(config: DevCommConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(ResolverState {
                config,
                ..ResolverState::default()
            }),
        })
    }

    pub fn config(&self) -> DevCommConfig {
        self.state.read().config.clone()
    }

    /// Enable or disable device address swaps.
    pub fn set_device_comm_flag(&self, enabled: bool) {
        self.state.write().config.device_comm_enabled = enabled;
        info!(category = "devcomm", enabled, "Device communication flag set");
    }

    /// Enable or disable PLC address swaps.
    pub fn set_plc_comm_flag(&self, enabled: bool) {
        self.state.write().config.plc_comm_enabled = enabled;
        info!(category = "devcomm", enabled, "PLC communication flag set");
    }

    pub fn device_comm_enabled(&self) -> bool {
        self.state.read().config.device_comm_enabled
    }

    pub fn plc_comm_enabled(&self) -> bool {
        self.state.read().config.plc_comm_enabled
    }

    /// Remember the combined mapping file used by [`AddressResolver::reload`].
    pub fn init_map_file_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = BoundedString::from_path(path.as_ref())?;
        debug!(category = "devcomm", path = %path, "Mapping file path set");
        self.state.write().config.mem_map_path = Some(PathBuf::from(path.into_inner()));
        Ok(())
    }

    fn commit(&self, pending: PendingLoad) -> LoadSummary {
        let summary = pending.summary.clone();
        self.state.write().commit(pending);
        summary
    }

    /// Load a device mapping file and rebuild the device table.
    pub fn load_device_mapping_file(&self, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        let config = self.config();
        let report = loader::load_device_mapping_file(path, &config)?;

        let mut pending = PendingLoad::default();
        pending.add_device(path, report.records, report.skipped);
        Ok(self.commit(pending))
    }

    /// Load a PLC mapping file and rebuild the PLC table.
    pub fn load_plc_mapping_file(&self, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        let config = self.config();
        let report = loader::load_plc_mapping_file(path, &config)?;

        let mut pending = PendingLoad::default();
        pending.add_plc(path, report.records, report.skipped);
        Ok(self.commit(pending))
    }

    /// Load a file whose kind is given by `mode`, or inferred with [`LoadMode::Auto`].
    ///
    /// Only tables the file addressed are rebuilt: the forced kind, a
    /// section header, or a record line of that shape. An empty section
    /// still clears its table under [`ReloadPolicy::Replace`].
    pub fn load_mem_mapping_file(&self, path: impl AsRef<Path>, mode: LoadMode) -> Result<LoadSummary> {
        let path = path.as_ref();
        let config = self.config();
        let mut pending = PendingLoad::default();
        self.read_mem_mapping_file(path, mode, &config, &mut pending)?;
        Ok(self.commit(pending))
    }

    fn read_mem_mapping_file(
        &self,
        path: &Path,
        mode: LoadMode,
        config: &DevCommConfig,
        pending: &mut PendingLoad,
    ) -> Result<()> {
        let report = loader::load_mem_mapping_file(path, mode, config)?;
        let touches_device = report.saw_device;
        let touches_plc = report.saw_plc;

        pending.note_path(path);
        pending.summary.skipped.extend(report.skipped);
        pending.summary.skipped.extend(report.device.skipped);
        pending.summary.skipped.extend(report.plc.skipped);
        if touches_device {
            pending.add_device(path, report.device.records, Vec::new());
        }
        if touches_plc {
            pending.add_plc(path, report.plc.records, Vec::new());
        }
        Ok(())
    }

    /// Reload every mapping file named in the config.
    ///
    /// All files are parsed before anything is committed; if one fails the
    /// resolver keeps its previous state.
    pub fn reload(&self) -> Result<LoadSummary> {
        let config = self.config();
        if config.mem_map_path.is_none()
            && config.device_map_path.is_none()
            && config.plc_map_path.is_none()
        {
            return Err(Error::Config("no mapping file path configured".to_string()));
        }

        let mut pending = PendingLoad::default();
        if let Some(path) = &config.mem_map_path {
            self.read_mem_mapping_file(path, LoadMode::Auto, &config, &mut pending)?;
        }
        if let Some(path) = &config.device_map_path {
            let report = loader::load_device_mapping_file(path, &config)?;
            pending.add_device(path, report.records, report.skipped);
        }
        if let Some(path) = &config.plc_map_path {
            let report = loader::load_plc_mapping_file(path, &config)?;
            pending.add_plc(path, report.records, report.skipped);
        }
        Ok(self.commit(pending))
    }

    /// Drop all records and tables. Flags and filters are kept.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.dev_records.clear();
        state.plc_records.clear();
        state.dev_table = DeviceAddressTable::default();
        state.plc_table = PlcAddressTable::default();
        info!(category = "devcomm", "Cleared address tables");
    }

    /// Replace the active filter list.
    pub fn set_comm_filters(&self, filters: Vec<DevCommFilterInfo>) {
        self.state.write().comm_filters = filters;
    }

    /// Add or update one active filter by name.
    pub fn add_comm_filter(&self, filter: DevCommFilterInfo) {
        let mut state = self.state.write();
        match state
            .comm_filters
            .iter_mut()
            .find(|f| f.filter_name.eq_ignore_ascii_case(&filter.filter_name))
        {
            Some(existing) => existing.filter_value = filter.filter_value,
            None => state.comm_filters.push(filter),
        }
    }

    pub fn comm_filters(&self) -> Vec<DevCommFilterInfo> {
        self.state.read().comm_filters.clone()
    }

    /// Resolve a device filter such as `DEV1:INWORD`.
    ///
    /// `Ok(None)` means no mapping matched.
    #[doc(alias = "swap")]
    pub fn resolve_device_address(&self, filter: &str) -> Result<Option<DevCommAddrInfo>> {
        let state = self.state.read();
        if !state.config.device_comm_enabled {
            return Err(Error::FeatureDisabled(CommKind::Device));
        }

        let sep = state.config.key_separator;
        let filter = DeviceFilter::parse(filter, sep)?;
        let key = filter.key(sep);
        if !matches_filter_list(&state.comm_filters, &filter.constraints) {
            debug!(category = "devcomm", key = %key, "Device filter constraints not met");
            return Ok(None);
        }

        let entry = state.dev_table.get(&key).cloned();
        debug!(category = "devcomm", key = %key, found = entry.is_some(), "Device address swap");
        Ok(entry)
    }

    /// Resolve a PLC filter such as `M1:V1:WORD`.
    ///
    /// `extra` is a secondary filter over non-key fields (see
    /// [`PlcFieldFilter`]); when given, the entry must match it too.
    #[doc(alias = "swap")]
    pub fn resolve_plc_address(
        &self,
        filter: &str,
        extra: Option<&str>,
    ) -> Result<Option<PlcCommAddrInfo>> {
        let state = self.state.read();
        if !state.config.plc_comm_enabled {
            return Err(Error::FeatureDisabled(CommKind::Plc));
        }

        let sep = state.config.key_separator;
        let filter = PlcFilter::parse(filter, sep)?;
        let extra = extra.map(PlcFieldFilter::parse).transpose()?;
        let key = filter.key(sep);
        if !matches_filter_list(&state.comm_filters, &filter.constraints) {
            debug!(category = "devcomm", key = %key, "PLC filter constraints not met");
            return Ok(None);
        }

        let entry = state
            .plc_table
            .get(&key)
            .filter(|entry| extra.as_ref().is_none_or(|f| f.matches(entry)))
            .cloned();
        debug!(category = "devcomm", key = %key, found = entry.is_some(), "PLC address swap");
        Ok(entry)
    }

    /// Replace `filter` in place with the mapped device target address.
    ///
    /// Returns `Ok(false)` and leaves `filter` untouched when nothing matched.
    pub fn swap_dev_comm_addr(&self, filter: &mut String) -> Result<bool> {
        match self.resolve_device_address(filter)? {
            Some(entry) => {
                *filter = entry.target_addr;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace `filter` in place with the mapped PLC target address.
    pub fn swap_plc_comm_addr(&self, filter: &mut String, extra: Option<&str>) -> Result<bool> {
        match self.resolve_plc_address(filter, extra)? {
            Some(entry) => {
                *filter = entry.plc_target_addr;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn device_records(&self) -> Vec<DevMemInfo> {
        self.state.read().dev_records.clone()
    }

    pub fn plc_records(&self) -> Vec<PlcMemInfo> {
        self.state.read().plc_records.clone()
    }

    /// Copy of the current device table.
    pub fn device_table(&self) -> DeviceAddressTable {
        self.state.read().dev_table.clone()
    }

    /// Copy of the current PLC table.
    pub fn plc_table(&self) -> PlcAddressTable {
        self.state.read().plc_table.clone()
    }

    /// Device table keys, sorted.
    pub fn device_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().dev_table.keys().map(str::to_string).collect();
        keys.sort();
        keys
    }

    /// PLC table keys, sorted.
    pub fn plc_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().plc_table.keys().map(str::to_string).collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> ResolverStats {
        let state = self.state.read();
        ResolverStats {
            device_records: state.dev_records.len(),
            plc_records: state.plc_records.len(),
            device_entries: state.dev_table.len(),
            plc_entries: state.plc_table.len(),
            device_comm_enabled: state.config.device_comm_enabled,
            plc_comm_enabled: state.config.plc_comm_enabled,
            comm_filters: state.comm_filters.clone(),
        }
    }
}
