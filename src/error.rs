//! Error handling for channel export operations.
//!
//! Covers range-list and group selection problems, inconsistent table data
//! and failures reported by the measurement file reader.

use crate::mdf::MdfError;
use crate::models::GroupKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid channel range '{token}': {reason}")]
    InvalidRange { token: String, reason: String },

    #[error("Channel {index} does not exist (channel group has {channel_count} channels)")]
    ChannelOutOfBounds { index: usize, channel_count: usize },

    #[error("More than one {kind} in file ({count} found). Use `{flag}' option to choose {kind}", flag = .kind.flag())]
    AmbiguousGroup { kind: GroupKind, count: usize },

    #[error("{group} {index} does not exist in file ({count} available)", group = .kind.title())]
    GroupNotFound {
        kind: GroupKind,
        index: usize,
        count: usize,
    },

    #[error("Column '{column}' has {found} samples, expected at least {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Source(#[from] MdfError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Whether the user can fix the problem by changing the command line
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidRange { .. }
                | ExportError::ChannelOutOfBounds { .. }
                | ExportError::AmbiguousGroup { .. }
                | ExportError::GroupNotFound { .. }
        )
    }

    /// Whether the reader of the output went away before it was written
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, ExportError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_broken_pipe_is_recognized() {
        let closed = ExportError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(closed.is_broken_pipe());
        assert!(!closed.is_selection_error());

        let full = ExportError::from(io::Error::other("disk full"));
        assert!(!full.is_broken_pipe());

        let source = ExportError::from(MdfError::NotMdf {
            reason: "empty".to_string(),
        });
        assert!(!source.is_broken_pipe());
    }
}
