//! Address table builder.
//!
//! Each record type derives a normalized key from its identifier fields and
//! converts itself into the entry stored under that key. Tables are built
//! wholesale from a record list; a later record with the same key replaces
//! an earlier one.

use std::collections::HashMap;

use crate::model::{DevCommAddrInfo, DevMemInfo, PlcCommAddrInfo, PlcMemInfo};
use crate::util::to_lowercase;

/// Key of the device table: `lower(dev_id) + sep + lower(mem_type)`.
pub fn device_key(dev_id: &str, mem_type: &str, sep: char) -> String {
    format!("{}{}{}", to_lowercase(dev_id), sep, to_lowercase(mem_type))
}

/// Key of the PLC table: machine, vendor and data type, lowercased.
pub fn plc_key(machine_id: &str, vendor_code: &str, data_type: &str, sep: char) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        to_lowercase(machine_id),
        to_lowercase(vendor_code),
        to_lowercase(data_type),
    )
}

/// A loaded record that can populate an address table.
pub trait MappingRecord {
    type Entry: Clone;

    /// Normalized table key.
    fn key(&self, sep: char) -> String;

    /// Translated entry stored under [`MappingRecord::key`].
    fn to_entry(&self) -> Self::Entry;
}

impl MappingRecord for DevMemInfo {
    type Entry = DevCommAddrInfo;

    fn key(&self, sep: char) -> String {
        device_key(&self.dev_id, &self.dev_mem_type, sep)
    }

    fn to_entry(&self) -> DevCommAddrInfo {
        DevCommAddrInfo::from(self)
    }
}

impl MappingRecord for PlcMemInfo {
    type Entry = PlcCommAddrInfo;

    fn key(&self, sep: char) -> String {
        plc_key(&self.machine_id, &self.vendor_code, &self.data_type, sep)
    }

    fn to_entry(&self) -> PlcCommAddrInfo {
        PlcCommAddrInfo::from(self)
    }
}

/// Normalized key to translated address entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTable<T> {
    entries: HashMap<String, T>,
}

pub type DeviceAddressTable = AddressTable<DevCommAddrInfo>;
pub type PlcAddressTable = AddressTable<PlcCommAddrInfo>;

impl<T> Default for AddressTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> AddressTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from records, last record per key wins.
    pub fn build<'a, R, I>(records: I, sep: char) -> Self
    where
        R: MappingRecord<Entry = T> + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut table = Self::new();
        for record in records {
            table.insert(record.key(sep), record.to_entry());
        }
        table
    }

    /// Insert or overwrite, returning the replaced entry.
    pub fn insert(&mut self, key: String, entry: T) -> Option<T> {
        self.entries.insert(key, entry)
    }

    /// Look up an already normalized key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Build the device table from device records.
pub fn build_device_table(records: &[DevMemInfo], sep: char) -> DeviceAddressTable {
    AddressTable::build(records, sep)
}

/// Build the PLC table from PLC records.
pub fn build_plc_table(records: &[PlcMemInfo], sep: char) -> PlcAddressTable {
    AddressTable::build(records, sep)
}
