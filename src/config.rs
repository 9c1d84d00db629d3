//! Output formatting configuration.
//!
//! `FormatConfig` is built once from the command line and handed to the
//! table writer as an immutable value.

use crate::constants::{DEFAULT_COLUMN_DELIMITER, DEFAULT_ROW_DELIMITER};

/// Delimiters and optional metadata rows for delimited text output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Separator placed between the fields of a line
    pub column_delimiter: String,

    /// Terminator written after every line, including the last
    pub row_delimiter: String,

    /// Emit a line of channel names before the data
    pub show_header: bool,

    /// Emit a line of channel units before the data
    pub show_units: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            column_delimiter: DEFAULT_COLUMN_DELIMITER.to_string(),
            row_delimiter: DEFAULT_ROW_DELIMITER.to_string(),
            show_header: true,
            show_units: true,
        }
    }
}

impl FormatConfig {
    /// Use a custom column delimiter
    pub fn with_column_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.column_delimiter = delimiter.into();
        self
    }

    /// Use a custom row delimiter
    pub fn with_row_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.row_delimiter = delimiter.into();
        self
    }

    /// Enable or disable the channel name line
    pub fn with_header(mut self, show: bool) -> Self {
        self.show_header = show;
        self
    }

    /// Enable or disable the unit line
    pub fn with_units(mut self, show: bool) -> Self {
        self.show_units = show;
        self
    }

    /// Number of metadata lines written before the data rows
    pub fn metadata_line_count(&self) -> usize {
        usize::from(self.show_header) + usize::from(self.show_units)
    }
}
