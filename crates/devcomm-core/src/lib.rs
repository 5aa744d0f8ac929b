//! Device and PLC memory address mapping.
//!
//! This crate maps external fieldbus device memory and NC internal PLC memory
//! onto platform memory blocks. Mapping files are parsed into records, the
//! records populate two address tables, and filter expressions are "swapped"
//! for the translated address entry.
//!
//! ## Architecture
//!
//! ```text
//! mapping file ─→ parser ─→ loader ─→ DevMemInfo / PlcMemInfo
//!                                           │
//!                                     table builder
//!                                           │
//!           "DEV1:INWORD" ─→ AddressResolver ─→ DevCommAddrInfo
//!           "M1:V1:WORD"  ─→                ─→ PlcCommAddrInfo
//! ```
//!
//! - **parser**: field splitting and cleaning
//! - **loader**: device, PLC and combined mapping files
//! - **table**: key derivation and last-write-wins tables
//! - **filter**: positional and `name=value` filter expressions
//! - **resolver**: owns the tables, flags and filter list

pub mod bounded;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod table;
pub mod util;

pub use bounded::BoundedString;
pub use config::{DevCommConfig, ReloadPolicy};
pub use error::{CommKind, Error, Result};
pub use filter::{DeviceFilter, PlcFieldFilter, PlcFilter};
pub use loader::{
    load_device_mapping_file, load_mem_mapping_file, load_plc_mapping_file, LoadMode,
    LoadReport, MemMapReport, SkippedLine,
};
pub use model::{
    DataType, DevCommAddrInfo, DevCommFilterInfo, DevMemInfo, PlcCommAddrInfo, PlcMemInfo,
};
pub use resolver::{AddressResolver, LoadSummary, ResolverStats};
pub use table::{
    build_device_table, build_plc_table, device_key, plc_key, AddressTable, DeviceAddressTable,
    MappingRecord, PlcAddressTable,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{defaults, limits, DevCommConfig, ReloadPolicy};
    pub use crate::error::{CommKind, Error, Result};
    pub use crate::loader::LoadMode;
    pub use crate::model::{
        DataType, DevCommAddrInfo, DevCommFilterInfo, DevMemInfo, PlcCommAddrInfo, PlcMemInfo,
    };
    pub use crate::resolver::{AddressResolver, LoadSummary};
}
