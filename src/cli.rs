//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `fsprobe`.
#[derive(Debug, Parser)]
#[command(name = "fsprobe", version, about = "Narrated tour of filesystem primitives")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reset the scratch tree and run the demo script.
    Run {
        /// Scratch directory to reset and probe.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Only run top-level sections whose title contains this text.
        #[arg(long)]
        section: Option<String>,
        /// How long the watch probe observes its file, in milliseconds.
        #[arg(long)]
        watch_ms: Option<u64>,
        /// Write a YAML record of every step to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Reset the scratch tree without running any probe.
    Reset {
        /// Scratch directory to reset.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Check the seeded contents afterwards.
        #[arg(long)]
        verify: bool,
    },
    /// List the demo script without running it.
    Steps {
        /// Only list top-level sections whose title contains this text.
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_run_with_every_flag() {
        let cli = Cli::parse_from([
            "fsprobe",
            "run",
            "--data-dir",
            "/tmp/scratch",
            "--section",
            "links",
            "--watch-ms",
            "250",
            "--report",
            "run.yaml",
        ]);
        match cli.command {
            Command::Run { data_dir, section, watch_ms, report } => {
                assert_eq!(data_dir, Some(PathBuf::from("/tmp/scratch")));
                assert_eq!(section.as_deref(), Some("links"));
                assert_eq!(watch_ms, Some(250));
                assert_eq!(report, Some(PathBuf::from("run.yaml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_bare_run() {
        let cli = Cli::parse_from(["fsprobe", "run"]);
        assert!(matches!(
            cli.command,
            Command::Run { data_dir: None, section: None, watch_ms: None, report: None }
        ));
    }

    #[test]
    fn parses_reset_verify() {
        let cli = Cli::parse_from(["fsprobe", "reset", "--verify"]);
        assert!(matches!(cli.command, Command::Reset { data_dir: None, verify: true }));
    }

    #[test]
    fn rejects_non_numeric_watch_duration() {
        assert!(Cli::try_parse_from(["fsprobe", "run", "--watch-ms", "soon"]).is_err());
    }

    #[test]
    fn parses_steps_subcommand() {
        let cli = Cli::parse_from(["fsprobe", "steps"]);
        assert!(matches!(cli.command, Command::Steps { section: None }));
    }
}
