//! Core library entry for the `fsprobe` CLI.

pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fixture;
pub mod logging;
pub mod probes;
pub mod report;
pub mod sequencer;
pub mod sys;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
