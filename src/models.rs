//! Core data structures shared by the export pipeline.
//!
//! Defines the group kinds used when resolving a selection, the column and
//! table types assembled from selected channels, and export statistics.

use std::fmt;

/// Level of the measurement file hierarchy a selection applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    DataGroup,
    ChannelGroup,
}

impl GroupKind {
    /// Command-line flag used to choose a group of this kind explicitly
    pub fn flag(&self) -> &'static str {
        match self {
            GroupKind::DataGroup => "-g",
            GroupKind::ChannelGroup => "-p",
        }
    }

    /// Capitalized name for the start of a message
    pub fn title(&self) -> &'static str {
        match self {
            GroupKind::DataGroup => "Data group",
            GroupKind::ChannelGroup => "Channel group",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::DataGroup => f.write_str("data group"),
            GroupKind::ChannelGroup => f.write_str("channel group"),
        }
    }
}

/// Ordered channel indices resolved from user input
///
/// Input order is kept as given, including repeats and overlapping ranges.
pub type SelectionList = Vec<usize>;

/// One exported channel: name, unit and its decoded samples
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub unit: String,
    pub samples: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Columns from a single channel group, aligned by sample position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Number of data rows, taken from the first column
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Summary of a completed export
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    pub data_group: usize,
    pub channel_group: usize,
    pub columns_written: usize,
    pub rows_written: usize,
}
