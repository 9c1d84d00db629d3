//! Assembles selected channels into a table.

use crate::error::Result;
use crate::models::{Column, Table};
use crate::selection::Selection;
use crate::source::ChannelSource;
use tracing::debug;

/// Read every selected channel, in selection order, into one column each
///
/// A channel listed twice is decoded twice. Reader failures are returned
/// as they are.
pub fn build_table<C: ChannelSource>(selection: &Selection<'_, C>) -> Result<Table> {
    let mut columns = Vec::with_capacity(selection.channels.len());

    for channel in selection.selected_channels() {
        let samples = channel.read_samples()?;
        debug!(
            "Read {} samples for channel '{}'",
            samples.len(),
            channel.name()
        );
        columns.push(Column::new(channel.name(), channel.unit(), samples));
    }

    Ok(Table::new(columns))
}
