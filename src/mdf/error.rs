//! Errors raised while reading MDF 4 files.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdfError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an MDF file: {reason}")]
    NotMdf { reason: String },

    #[error("Unsupported MDF version {version}, at least 4.00 is required")]
    UnsupportedVersion { version: u16 },

    #[error("Expected {expected} block at offset {offset:#x}, found '{found}'")]
    UnexpectedBlock {
        offset: u64,
        expected: String,
        found: String,
    },

    #[error("File is truncated: {needed} bytes needed at offset {offset:#x}")]
    Truncated { offset: u64, needed: u64 },

    #[error("Link to offset {offset:#x} points outside the file")]
    InvalidLink { offset: u64 },

    #[error("Linked list of {block} blocks loops back to offset {offset:#x}")]
    LinkCycle { block: String, offset: u64 },

    #[error("Channel '{channel}' cannot be exported: {reason}")]
    UnsupportedChannel { channel: String, reason: String },

    #[error("Channel '{channel}' uses unsupported conversion type {conversion_type}")]
    UnsupportedConversion { channel: String, conversion_type: u8 },

    #[error("Channel group {record_id} announces {cycle_count} records, more than its data can hold")]
    ImplausibleRecordCount { record_id: u64, cycle_count: u64 },

    #[error("Unsupported data block: {reason}")]
    UnsupportedData { reason: String },

    #[error("Failed to decompress data block at offset {offset:#x}: {source}")]
    Decompression {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {block} block at offset {offset:#x}")]
    Parse { block: String, offset: u64 },
}

pub type Result<T> = std::result::Result<T, MdfError>;
