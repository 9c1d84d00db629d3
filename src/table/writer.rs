//! Delimited text serialization of a table.
//!
//! Writes an optional line of channel names, an optional line of units and
//! then one line per sample position. Every line, including the last, ends
//! with the row delimiter.

use crate::config::FormatConfig;
use crate::constants::SAMPLE_DECIMAL_PLACES;
use crate::error::{ExportError, Result};
use crate::models::Table;
use std::io::Write;
use tracing::debug;

/// Writes tables using a fixed format
#[derive(Debug, Clone)]
pub struct TableWriter {
    config: FormatConfig,
}

impl TableWriter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    /// Serialize `table` to `out` and return the number of data rows written
    ///
    /// The number of rows is the length of the first column. Columns are
    /// checked before anything is written, so a column shorter than the
    /// first one fails with [`ExportError::ColumnLengthMismatch`] and leaves
    /// `out` untouched. Samples past the row count are not written.
    pub fn write<W: Write>(&self, table: &Table, out: &mut W) -> Result<usize> {
        if table.is_empty() {
            return Ok(0);
        }

        let row_count = table.row_count();
        check_column_lengths(table, row_count)?;

        let column_delimiter = self.config.column_delimiter.as_bytes();
        let row_delimiter = self.config.row_delimiter.as_bytes();

        if self.config.show_header {
            write_joined(
                out,
                table.columns.iter().map(|c| c.name.as_str()),
                column_delimiter,
            )?;
            out.write_all(row_delimiter)?;
        }

        if self.config.show_units {
            write_joined(
                out,
                table.columns.iter().map(|c| c.unit.as_str()),
                column_delimiter,
            )?;
            out.write_all(row_delimiter)?;
        }

        for row in 0..row_count {
            for (i, column) in table.columns.iter().enumerate() {
                if i > 0 {
                    out.write_all(column_delimiter)?;
                }
                out.write_all(format_sample(column.samples[row]).as_bytes())?;
            }
            out.write_all(row_delimiter)?;
        }

        debug!(
            "Wrote {} rows of {} columns",
            row_count,
            table.columns.len()
        );
        Ok(row_count)
    }
}

/// Format a sample as fixed-point with six fractional digits
///
/// Non-finite values are written as `nan`, `inf` and `-inf`.
pub fn format_sample(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else {
        format!("{:.*}", SAMPLE_DECIMAL_PLACES, value)
    }
}

fn check_column_lengths(table: &Table, row_count: usize) -> Result<()> {
    match table.columns.iter().find(|c| c.len() < row_count) {
        Some(column) => Err(ExportError::ColumnLengthMismatch {
            column: column.name.clone(),
            expected: row_count,
            found: column.len(),
        }),
        None => Ok(()),
    }
}

fn write_joined<'a, W: Write>(
    out: &mut W,
    fields: impl Iterator<Item = &'a str>,
    delimiter: &[u8],
) -> std::io::Result<()> {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.write_all(delimiter)?;
        }
        out.write_all(field.as_bytes())?;
    }
    Ok(())
}
