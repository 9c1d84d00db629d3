//! Application constants for mdf4-export
//!
//! Default output formatting, logging settings and the MDF 4 block layout
//! values used by the reader.

// =============================================================================
// Output Formatting
// =============================================================================

/// Field separator used when `--delimiter` is not given
pub const DEFAULT_COLUMN_DELIMITER: &str = ",";

/// Line terminator used when `--row-delimiter` is not given
pub const DEFAULT_ROW_DELIMITER: &str = "\n";

/// Fractional digits printed for every sample value
pub const SAMPLE_DECIMAL_PLACES: usize = 6;

// =============================================================================
// Range List Grammar
// =============================================================================

/// Separates the ranges of a channel list
pub const RANGE_LIST_SEPARATOR: char = ',';

/// Separates the two ends of a single range
pub const RANGE_BOUND_SEPARATOR: char = '-';

// =============================================================================
// Logging
// =============================================================================

/// Target prefix used for the default log filter
pub const LOG_TARGET: &str = "mdf4_export";

/// Hint appended to diagnostics the user can fix from the command line
pub const HELP_HINT: &str = "Try `mdf4-export --help' for more information.";

// =============================================================================
// MDF 4 Layout
// =============================================================================

/// Block identifiers and fixed offsets of the MDF 4 format
pub mod mdf_blocks {
    /// File identifier at offset 0
    pub const FILE_ID: &[u8; 8] = b"MDF     ";

    /// Files starting with this identifier have not been finalized
    pub const UNFINISHED_FILE_ID: &[u8; 8] = b"UnFinMF ";

    /// Size of the identification block
    pub const ID_BLOCK_SIZE: usize = 64;

    /// Offset of the header block
    pub const HD_OFFSET: u64 = 64;

    /// Size of the common block header (id, reserved, length, link count)
    pub const BLOCK_HEADER_SIZE: usize = 24;

    /// Lowest supported version number
    pub const MIN_VERSION: u16 = 400;

    pub const HD: &[u8; 4] = b"##HD";
    pub const DG: &[u8; 4] = b"##DG";
    pub const CG: &[u8; 4] = b"##CG";
    pub const CN: &[u8; 4] = b"##CN";
    pub const CC: &[u8; 4] = b"##CC";
    pub const TX: &[u8; 4] = b"##TX";
    pub const MD: &[u8; 4] = b"##MD";
    pub const DT: &[u8; 4] = b"##DT";
    pub const DL: &[u8; 4] = b"##DL";
    pub const DZ: &[u8; 4] = b"##DZ";
    pub const HL: &[u8; 4] = b"##HL";
}

/// Channel type codes (`cn_type`)
pub mod channel_types {
    pub const FIXED_LENGTH: u8 = 0;
    pub const VARIABLE_LENGTH: u8 = 1;
    pub const MASTER: u8 = 2;
    pub const VIRTUAL_MASTER: u8 = 3;
    pub const SYNCHRONIZATION: u8 = 4;
    pub const MAXIMUM_LENGTH: u8 = 5;
    pub const VIRTUAL_DATA: u8 = 6;
}

/// Channel data type codes (`cn_data_type`)
pub mod data_types {
    pub const UNSIGNED_LE: u8 = 0;
    pub const UNSIGNED_BE: u8 = 1;
    pub const SIGNED_LE: u8 = 2;
    pub const SIGNED_BE: u8 = 3;
    pub const FLOAT_LE: u8 = 4;
    pub const FLOAT_BE: u8 = 5;
}

/// Conversion type codes (`cc_type`)
pub mod conversion_types {
    pub const IDENTITY: u8 = 0;
    pub const LINEAR: u8 = 1;
    pub const RATIONAL: u8 = 2;
}

/// Compression algorithm codes (`dz_zip_type`)
pub mod zip_types {
    pub const DEFLATE: u8 = 0;
    pub const TRANSPOSE_DEFLATE: u8 = 1;
}
