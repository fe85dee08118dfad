//! Run configuration resolved from CLI flags, the environment and defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the scratch data directory.
pub const DATA_DIR_VAR: &str = "FSPROBE_DATA_DIR";
/// Environment variable holding the watch duration in milliseconds.
pub const WATCH_MS_VAR: &str = "FSPROBE_WATCH_MS";
/// Environment variable naming the YAML run report destination.
pub const REPORT_VAR: &str = "FSPROBE_REPORT";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_WATCH_MS: u64 = 3000;

/// Values supplied on the command line; each wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Scratch directory override.
    pub data_dir: Option<PathBuf>,
    /// Watch duration override in milliseconds.
    pub watch_ms: Option<u64>,
    /// Report destination override.
    pub report: Option<PathBuf>,
}

/// Fully resolved settings for a demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Root of the fixture tree.
    pub data_dir: PathBuf,
    /// How long the watch probe observes its file.
    pub watch_duration: Duration,
    /// Where to write the YAML run report, if anywhere.
    pub report: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            watch_duration: Duration::from_millis(DEFAULT_WATCH_MS),
            report: None,
        }
    }
}

impl DemoConfig {
    /// Resolves settings from `overrides` and the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns an error string when an environment value cannot be parsed.
    pub fn resolve(overrides: &Overrides) -> Result<Self, String> {
        // A missing .env is the common case.
        let _ = dotenvy::dotenv();
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves settings using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error string when a looked-up value cannot be parsed.
    pub fn resolve_with<F>(overrides: &Overrides, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| lookup(DATA_DIR_VAR).map(PathBuf::from))
            .unwrap_or(defaults.data_dir);

        let watch_ms = match overrides.watch_ms {
            Some(ms) => ms,
            None => match lookup(WATCH_MS_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid {WATCH_MS_VAR} value {raw:?}: {e}"))?,
                None => DEFAULT_WATCH_MS,
            },
        };

        let report = overrides.report.clone().or_else(|| lookup(REPORT_VAR).map(PathBuf::from));

        Ok(Self { data_dir, watch_duration: Duration::from_millis(watch_ms), report })
    }
}
