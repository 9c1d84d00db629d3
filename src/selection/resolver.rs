//! Data group, channel group and channel selection.

use super::range::parse_ranges;
use crate::error::{ExportError, Result};
use crate::models::{GroupKind, SelectionList};
use crate::source::{ChannelGroup, DataGroup};
use tracing::{debug, info};

/// What the user asked to export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub data_group: Option<usize>,
    pub channel_group: Option<usize>,
    pub channels: Option<String>,
}

/// A resolved selection within one channel group
#[derive(Debug)]
pub struct Selection<'a, C> {
    pub data_group_index: usize,
    pub channel_group_index: usize,
    pub channel_group: &'a ChannelGroup<C>,
    pub channels: SelectionList,
}

impl<C> Selection<'_, C> {
    /// Channels in selection order
    pub fn selected_channels(&self) -> impl Iterator<Item = &C> + '_ {
        self.channels
            .iter()
            .map(move |&index| &self.channel_group.channels[index])
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Choose the channel group and channels to export
///
/// Groups given explicitly must exist. An omitted group is chosen only when
/// it is the single one at its level; with several candidates the caller
/// has to pick one. Without a range list every channel of the group is
/// selected in natural order.
pub fn resolve_selection<'a, C>(
    data_groups: &'a [DataGroup<C>],
    request: &SelectionRequest,
) -> Result<Selection<'a, C>> {
    let data_group_index =
        choose_group(GroupKind::DataGroup, data_groups.len(), request.data_group)?;
    let data_group = &data_groups[data_group_index];

    let channel_group_index = choose_group(
        GroupKind::ChannelGroup,
        data_group.channel_groups.len(),
        request.channel_group,
    )?;
    let channel_group = &data_group.channel_groups[channel_group_index];
    let channel_count = channel_group.channel_count();

    let channels = match request.channels.as_deref() {
        Some(spec) => parse_ranges(spec, channel_count)?,
        None => (0..channel_count).collect(),
    };

    info!(
        "Selected {} channels from data group {}, channel group {}",
        channels.len(),
        data_group_index,
        channel_group_index
    );

    Ok(Selection {
        data_group_index,
        channel_group_index,
        channel_group,
        channels,
    })
}

/// Pick a group index at one level of the hierarchy
fn choose_group(kind: GroupKind, count: usize, requested: Option<usize>) -> Result<usize> {
    let index = match requested {
        Some(index) => index,
        None if count > 1 => return Err(ExportError::AmbiguousGroup { kind, count }),
        None => {
            debug!("Only one {} available, selecting it", kind);
            0
        }
    };

    if index >= count {
        return Err(ExportError::GroupNotFound { kind, index, count });
    }

    Ok(index)
}
