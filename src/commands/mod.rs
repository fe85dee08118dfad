//! Command dispatch and handlers.

pub mod reset;
pub mod run;
pub mod steps;

use crate::cli::Command;
use crate::config::Overrides;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Run { data_dir, section, watch_ms, report } => {
            let overrides =
                Overrides { data_dir: data_dir.clone(), watch_ms: *watch_ms, report: report.clone() };
            run::run(&overrides, section.as_deref())
        }
        Command::Reset { data_dir, verify } => {
            let overrides = Overrides { data_dir: data_dir.clone(), ..Overrides::default() };
            reset::run(&overrides, *verify)
        }
        Command::Steps { section } => steps::run(section.as_deref()),
    }
}
