//! Runs a [`Script`] against a freshly reset fixture tree and prints the
//! narration.

pub mod probe;
pub mod script;

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::DemoConfig;
use crate::error::FixtureError;
use crate::fixture;
use crate::report::{RunRecorder, RunReport};

pub use probe::Probe;
pub use script::{Precondition, Script, ScriptBuilder, Step};

const INDENT: &str = "  ";

/// Fatal failures of a demo run. Probe failures are never fatal.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The fixture tree could not be seeded.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    /// Narration could not be written.
    #[error("failed to write narration: {0}")]
    Output(#[from] io::Error),
}

/// Output settings for the narration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    /// Wrap section titles in ANSI bold.
    pub bold_titles: bool,
}

/// Resets the tree at `config.data_dir`, then runs every step of `script`
/// in order, writing narration to `out`.
///
/// # Errors
///
/// Returns [`DemoError::Fixture`] when the reset fails (no step runs) and
/// [`DemoError::Output`] when `out` rejects a write.
pub async fn run(
    script: &Script,
    config: &DemoConfig,
    style: Style,
    out: &mut dyn Write,
) -> Result<RunReport, DemoError> {
    let tree = fixture::reset(&config.data_dir)?;
    debug!(root = %tree.root.display(), symlink = tree.symlink_created, "fixture ready");

    let mut recorder = RunRecorder::new(&tree.root);
    let mut open_sections: &[String] = &[];

    for step in script.steps() {
        print_headers(open_sections, &step.section, style, out)?;
        open_sections = &step.section;

        let indent = INDENT.repeat(step.section.len());
        writeln!(out, "{indent}{}) {}", step.number, step.title)?;

        if let Some(reason) = unmet_precondition(step, &tree.root) {
            info!(step = %step.title, %reason, "skipping step");
            writeln!(out, "{indent}{INDENT}skipped: {reason}")?;
            recorder.skipped(step, reason);
            continue;
        }

        let report = step.probe.run(&tree.root, config.watch_duration).await;
        for line in report.rendered() {
            writeln!(out, "{indent}{INDENT}{line}")?;
        }
        recorder.ran(step, &report);
    }

    out.flush()?;
    Ok(recorder.finish())
}

fn unmet_precondition(step: &Step, root: &std::path::Path) -> Option<String> {
    step.preconditions.iter().find_map(|pre| pre.check(root).err())
}

/// Prints the titles of every section in `next` that is not already open.
fn print_headers(
    open: &[String],
    next: &[String],
    style: Style,
    out: &mut dyn Write,
) -> io::Result<()> {
    let shared = open.iter().zip(next).take_while(|(a, b)| a == b).count();
    for (depth, title) in next.iter().enumerate().skip(shared) {
        if depth == 0 {
            writeln!(out)?;
        }
        let indent = INDENT.repeat(depth);
        if style.bold_titles {
            writeln!(out, "{indent}\x1b[1m{title}\x1b[0m")?;
        } else {
            writeln!(out, "{indent}{title}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StepStatus;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> DemoConfig {
        DemoConfig {
            data_dir: temp.path().join("data"),
            watch_duration: Duration::from_millis(150),
            report: None,
        }
    }

    fn p(path: &str) -> String {
        path.to_string()
    }

    #[tokio::test]
    async fn append_then_read_sees_both_pieces() {
        let temp = TempDir::new().unwrap();
        let mut b = ScriptBuilder::new();
        b.section("Files", |b| {
            b.step("append", Probe::Append { path: p("test1.txt"), data: p(" More important data.") });
            b.step("read", Probe::Read { path: p("test1.txt") });
        });
        let mut out = Vec::new();

        let run = run(&b.build(), &config(&temp), Style::default(), &mut out).await.unwrap();

        assert_eq!(run.count(StepStatus::Ok), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Here is some top secret data.  More important data."), "{text}");
    }

    #[tokio::test]
    async fn unmet_precondition_skips_without_running() {
        let temp = TempDir::new().unwrap();
        let mut b = ScriptBuilder::new();
        b.section("Files", |b| {
            b.step("write", Probe::Write { path: p("test1.txt"), data: p("clobbered") })
                .requires([Precondition::absent("test1.txt")]);
        });
        let cfg = config(&temp);
        let mut out = Vec::new();

        let run = run(&b.build(), &cfg, Style::default(), &mut out).await.unwrap();

        assert_eq!(run.count(StepStatus::Skipped), 1);
        assert_eq!(
            std::fs::read_to_string(cfg.data_dir.join("test1.txt")).unwrap(),
            "Here is some top secret data. "
        );
        assert!(String::from_utf8(out).unwrap().contains("skipped: test1.txt must not exist yet"));
    }

    #[tokio::test]
    async fn failures_are_printed_and_the_run_continues() {
        let temp = TempDir::new().unwrap();
        let mut b = ScriptBuilder::new();
        b.section("Files", |b| {
            b.step("missing", Probe::Read { path: p("nope.txt") });
            b.step("present", Probe::FileSize { path: p("test1.txt") });
        });
        let mut out = Vec::new();

        let run = run(&b.build(), &config(&temp), Style::default(), &mut out).await.unwrap();

        assert_eq!(run.count(StepStatus::Failed), 1);
        assert_eq!(run.count(StepStatus::Ok), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: "));
        assert!(text.contains("is 30 bytes"));
    }

    #[tokio::test]
    async fn headers_are_indented_and_printed_once() {
        let temp = TempDir::new().unwrap();
        let mut b = ScriptBuilder::new();
        b.section("Outer", |b| {
            b.section("Inner", |b| {
                b.step("one", Probe::FileSize { path: p("test1.txt") });
                b.step("two", Probe::FileSize { path: p("chmod.txt") });
            });
        });
        let mut out = Vec::new();

        run(&b.build(), &config(&temp), Style { bold_titles: true }, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\x1b[1mOuter\x1b[0m").count(), 1);
        assert_eq!(text.matches("  \x1b[1mInner\x1b[0m").count(), 1);
        assert!(text.contains("\n    1) one\n"));
        assert!(text.contains("\n    2) two\n"));
    }

    #[tokio::test]
    async fn reset_failure_stops_the_run() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let cfg = DemoConfig { data_dir: blocker.join("data"), ..config(&temp) };
        let mut out = Vec::new();

        let err = run(&Script::standard(), &cfg, Style::default(), &mut out).await.unwrap_err();

        assert!(matches!(err, DemoError::Fixture(_)));
        assert!(out.is_empty());
    }
}
