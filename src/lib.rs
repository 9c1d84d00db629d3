//! mdf4-export library
//!
//! Exports channels of ASAM MDF 4 measurement files as delimited text.
//!
//! The pieces, in the order an export runs through them:
//! - [`mdf`] opens a file and exposes its data groups, channel groups and
//!   channels
//! - [`selection`] parses channel range lists and picks the channel group
//!   and channels to export
//! - [`table`] reads the selected channels into columns and writes them as
//!   delimited rows
//! - [`export`] ties these together for a single invocation

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod mdf;
pub mod models;
pub mod selection;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use config::FormatConfig;
pub use error::{ExportError, Result};
pub use export::{export_file, export_groups};
pub use mdf::{MdfChannel, MdfError, MdfFile};
pub use models::{Column, ExportStats, GroupKind, SelectionList, Table};
pub use selection::{SelectionRequest, parse_ranges, resolve_selection};
pub use source::{ChannelGroup, ChannelSource, DataGroup, InMemoryChannel};
pub use table::{TableWriter, build_table};
