//! Command-line argument definitions and logging setup.

use crate::config::FormatConfig;
use crate::constants::{DEFAULT_COLUMN_DELIMITER, DEFAULT_ROW_DELIMITER, LOG_TARGET};
use crate::selection::SelectionRequest;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

const CHANNEL_LIST_HELP: &str = "\
Channel lists:
  LIST is a comma separated list of ranges, each one of
    N      channel N
    N-M    channels N to M inclusive (nothing when N > M)
    N-     channel N to the last channel
    -M     the first channel to channel M
  Channels are exported in the order given; repeats are kept.
  Indices start at 0.

Data groups and channel groups are chosen automatically only when a file
has exactly one of them.";

/// Export channels of an ASAM MDF 4 file as delimited text
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mdf4-export",
    version,
    about = "Export channels of an ASAM MDF 4 file as delimited text",
    after_help = CHANNEL_LIST_HELP
)]
pub struct Args {
    /// Measurement file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print a line of channel names (default)
    #[arg(
        short = 's',
        long = "column-header",
        overrides_with = "no_column_header",
        help = "Print column header (default)"
    )]
    pub column_header: bool,

    #[arg(
        short = 'S',
        long = "no-column-header",
        overrides_with = "column_header",
        help = "Do not print column header"
    )]
    pub no_column_header: bool,

    /// Print a line of channel units (default)
    #[arg(
        short = 'u',
        long = "unit-row",
        overrides_with = "no_unit_row",
        help = "Print unit row (default)"
    )]
    pub unit_row: bool,

    #[arg(
        short = 'U',
        long = "no-unit-row",
        overrides_with = "unit_row",
        help = "Do not print unit row"
    )]
    pub no_unit_row: bool,

    #[arg(
        short = 'd',
        long = "delimiter",
        value_name = "DELIM",
        default_value = DEFAULT_COLUMN_DELIMITER,
        help = "Column delimiter"
    )]
    pub delimiter: String,

    #[arg(
        short = 'r',
        long = "row-delimiter",
        value_name = "DELIM",
        default_value = DEFAULT_ROW_DELIMITER,
        hide_default_value = true,
        help = "Row delimiter [default: newline]"
    )]
    pub row_delimiter: String,

    #[arg(
        short = 'g',
        long = "data-group",
        value_name = "N",
        help = "Data group to export from"
    )]
    pub data_group: Option<usize>,

    #[arg(
        short = 'p',
        long = "channel-group",
        value_name = "N",
        help = "Channel group to export from"
    )]
    pub channel_group: Option<usize>,

    #[arg(
        short = 'c',
        long = "channels",
        value_name = "LIST",
        allow_hyphen_values = true,
        help = "Channels to export (default: all)"
    )]
    pub channels: Option<String>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        conflicts_with = "verbose",
        help = "Only report errors"
    )]
    pub quiet: bool,
}

impl Args {
    /// Output format chosen on the command line
    ///
    /// Header and unit rows are on unless the last flag of their pair
    /// turned them off.
    pub fn format_config(&self) -> FormatConfig {
        FormatConfig::default()
            .with_column_delimiter(self.delimiter.as_str())
            .with_row_delimiter(self.row_delimiter.as_str())
            .with_header(!self.no_column_header)
            .with_units(!self.no_unit_row)
    }

    pub fn selection_request(&self) -> SelectionRequest {
        SelectionRequest {
            data_group: self.data_group,
            channel_group: self.channel_group,
            channels: self.channels.clone(),
        }
    }

    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence over the level chosen with `-v` and `-q`.
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}
