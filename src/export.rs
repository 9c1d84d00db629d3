//! One export run: open, select, build and write.

use crate::config::FormatConfig;
use crate::error::Result;
use crate::mdf::MdfFile;
use crate::models::ExportStats;
use crate::selection::{SelectionRequest, resolve_selection};
use crate::source::{ChannelSource, DataGroup};
use crate::table::{TableWriter, build_table};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Export the selected channels of the MDF file at `path` to `out`
pub fn export_file<W: Write>(
    path: &Path,
    request: &SelectionRequest,
    config: &FormatConfig,
    out: W,
) -> Result<ExportStats> {
    let file = MdfFile::open(path)?;
    info!(
        "Exporting from {} (MDF {}, written by '{}')",
        path.display(),
        file.version(),
        file.program()
    );
    export_groups(file.data_groups(), request, config, out)
}

/// Export the selected channels of an already opened hierarchy
///
/// Output is buffered and flushed once after the whole table has been
/// written. An empty selection writes nothing.
pub fn export_groups<C: ChannelSource, W: Write>(
    data_groups: &[DataGroup<C>],
    request: &SelectionRequest,
    config: &FormatConfig,
    out: W,
) -> Result<ExportStats> {
    let selection = resolve_selection(data_groups, request)?;
    let mut stats = ExportStats {
        data_group: selection.data_group_index,
        channel_group: selection.channel_group_index,
        ..ExportStats::default()
    };

    if selection.is_empty() {
        info!("No channels selected, nothing to export");
        return Ok(stats);
    }

    let table = build_table(&selection)?;

    let mut out = BufWriter::new(out);
    stats.rows_written = TableWriter::new(config.clone()).write(&table, &mut out)?;
    out.flush()?;

    stats.columns_written = table.columns.len();
    info!(
        "Exported {} columns and {} rows",
        stats.columns_written, stats.rows_written
    );
    Ok(stats)
}
