//! Channel range-list parsing.
//!
//! A range list is one or more ranges separated by commas. Each range is
//! one of:
//!
//! | Form  | Selects                                   |
//! |-------|-------------------------------------------|
//! | `N`   | channel `N`, counted from 0               |
//! | `N-`  | channel `N` up to the last channel        |
//! | `N-M` | channels `N` to `M`, both included        |
//! | `-M`  | the first channel up to `M`, included     |
//!
//! Channels are returned in the order they are listed. Nothing is sorted
//! or deduplicated, so `3,1,1-2` yields `[3, 1, 1, 2]`.

use crate::constants::{RANGE_BOUND_SEPARATOR, RANGE_LIST_SEPARATOR};
use crate::error::{ExportError, Result};
use crate::models::SelectionList;
use tracing::debug;

/// One parsed range of a range list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `N`
    Single(usize),
    /// `-M`
    UpTo(usize),
    /// `N-`
    From(usize),
    /// `N-M`
    Bounded(usize, usize),
}

impl RangeSpec {
    /// Parse and bounds-check a single range token
    pub fn parse(token: &str, channel_count: usize) -> Result<Self> {
        let spec = match token.find(RANGE_BOUND_SEPARATOR) {
            None => RangeSpec::Single(parse_index(token, token, channel_count)?),
            Some(0) => RangeSpec::UpTo(parse_index(token, &token[1..], channel_count)?),
            Some(sep) if sep == token.len() - 1 => {
                RangeSpec::From(parse_index(token, &token[..sep], channel_count)?)
            }
            Some(sep) => {
                let start = parse_index(token, &token[..sep], channel_count)?;
                let end = parse_index(token, &token[sep + 1..], channel_count)?;
                RangeSpec::Bounded(start, end)
            }
        };
        Ok(spec)
    }

    /// Append the channels this range selects, in ascending order
    ///
    /// A bounded range whose start lies after its end selects nothing.
    pub fn expand_into(&self, channel_count: usize, selection: &mut SelectionList) {
        match *self {
            RangeSpec::Single(index) => selection.push(index),
            RangeSpec::UpTo(end) => selection.extend(0..=end),
            RangeSpec::From(start) => selection.extend(start..channel_count),
            RangeSpec::Bounded(start, end) => selection.extend(start..=end),
        }
    }
}

/// Resolve a range list into channel indices for a group of `channel_count`
/// channels
///
/// Fails with [`ExportError::InvalidRange`] when a range is malformed and
/// with [`ExportError::ChannelOutOfBounds`] when an endpoint names a channel
/// that does not exist. `N-M` with `N > M` contributes no channels and is
/// not an error.
pub fn parse_ranges(spec: &str, channel_count: usize) -> Result<SelectionList> {
    let mut selection = SelectionList::new();

    for token in spec.split(RANGE_LIST_SEPARATOR) {
        let range = RangeSpec::parse(token, channel_count)?;
        let before = selection.len();
        range.expand_into(channel_count, &mut selection);

        if selection.len() == before {
            debug!("Range '{}' selects no channels", token);
        }
    }

    debug!(
        "Range list '{}' resolved to {} channels",
        spec,
        selection.len()
    );
    Ok(selection)
}

/// Parse one endpoint of `token` and check it names an existing channel
fn parse_index(token: &str, digits: &str, channel_count: usize) -> Result<usize> {
    let value: i64 = digits.parse().map_err(|_| ExportError::InvalidRange {
        token: token.to_string(),
        reason: if digits.is_empty() {
            "missing channel number".to_string()
        } else {
            format!("'{}' is not a channel number", digits)
        },
    })?;

    let index = usize::try_from(value).map_err(|_| ExportError::InvalidRange {
        token: token.to_string(),
        reason: format!("channel number {} is negative", value),
    })?;

    if index >= channel_count {
        return Err(ExportError::ChannelOutOfBounds {
            index,
            channel_count,
        });
    }

    Ok(index)
}
