//! `fsprobe run` command.

use std::io::{self, IsTerminal};

use tracing::debug;

use crate::config::{DemoConfig, Overrides};
use crate::report::{self, StepStatus};
use crate::sequencer::{self, Script, Style};

/// Execute the `run` command.
///
/// Resets the scratch tree, runs the demo script (optionally narrowed to the
/// sections matching `section`) and prints a one-line summary. Probe
/// failures are part of the narration and never fail the command.
///
/// # Errors
///
/// Returns an error string if configuration, the reset, the narration
/// output or the report file fails.
pub fn run(overrides: &Overrides, section: Option<&str>) -> Result<(), String> {
    let config = DemoConfig::resolve(overrides)?;
    let script = match section {
        Some(needle) => Script::standard().only_sections(needle),
        None => Script::standard(),
    };
    if script.steps().is_empty() {
        return Err(format!("No section matches {:?}.", section.unwrap_or_default()));
    }
    debug!(
        data_dir = %config.data_dir.display(),
        watch_ms = config.watch_duration.as_millis(),
        steps = script.steps().len(),
        "starting demo run"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let stdout = io::stdout();
    let style = Style { bold_titles: stdout.is_terminal() };
    let mut out = stdout.lock();
    let run = runtime
        .block_on(sequencer::run(&script, &config, style, &mut out))
        .map_err(|e| e.to_string())?;
    drop(out);

    println!(
        "\n{} step(s): {} ok, {} failed, {} skipped.",
        run.steps.len(),
        run.count(StepStatus::Ok),
        run.count(StepStatus::Failed),
        run.count(StepStatus::Skipped),
    );

    if let Some(path) = &config.report {
        report::write(&run, path)
            .map_err(|e| format!("Failed to write report {}: {e}", path.display()))?;
        eprintln!("Report saved to: {}", path.display());
    }
    Ok(())
}
