use clap::Parser;
use colored::Colorize;
use mdf4_export::cli::{Args, setup_logging};
use mdf4_export::constants::HELP_HINT;
use mdf4_export::export_file;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Usage errors exit with status 2, help and version with 0
    let args = Args::parse();

    if let Err(error) = setup_logging(&args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let result = export_file(
        &args.file,
        &args.selection_request(),
        &args.format_config(),
        stdout.lock(),
    );

    match result {
        Ok(_stats) => ExitCode::SUCCESS,
        // stdout closed early, e.g. piped into `head`
        Err(error) if error.is_broken_pipe() => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", "Error:".bright_red().bold(), error);
            if error.is_selection_error() {
                eprintln!("{}", HELP_HINT);
            }
            ExitCode::FAILURE
        }
    }
}
