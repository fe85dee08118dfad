//! YAML record of a demo run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probes::ProbeReport;
use crate::sequencer::probe::Probe;
use crate::sequencer::script::Step;

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The probe ran and reported no failure.
    Ok,
    /// The probe ran and reported a failure.
    Failed,
    /// A precondition did not hold, so the probe never ran.
    Skipped,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position in the run (assigned automatically by the recorder).
    pub seq: u64,
    /// Section titles from outermost to innermost.
    pub section: Vec<String>,
    /// Step title.
    pub title: String,
    /// The probe and its arguments.
    pub probe: Probe,
    /// How the step ended.
    pub status: StepStatus,
    /// Failure class for failed steps, or the unmet precondition for skipped ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Narration as printed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

/// A complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run finished.
    pub recorded_at: DateTime<Utc>,
    /// Fixture root the run used.
    pub data_dir: PathBuf,
    /// Ordered step outcomes.
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    /// Counts steps with the given status.
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Collects step outcomes and optionally writes them as YAML.
#[derive(Debug)]
pub struct RunRecorder {
    data_dir: PathBuf,
    steps: Vec<StepRecord>,
    next_seq: u64,
}

impl RunRecorder {
    /// Starts an empty record for a run against `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), steps: Vec::new(), next_seq: 0 }
    }

    /// Records a step that ran.
    pub fn ran(&mut self, step: &Step, report: &ProbeReport) {
        let (status, reason) = match report.failure() {
            None => (StepStatus::Ok, None),
            Some(failure) => (StepStatus::Failed, Some(failure.kind().to_string())),
        };
        self.push(step, status, reason, report.rendered());
    }

    /// Records a step skipped for `reason`.
    pub fn skipped(&mut self, step: &Step, reason: impl Into<String>) {
        self.push(step, StepStatus::Skipped, Some(reason.into()), Vec::new());
    }

    fn push(&mut self, step: &Step, status: StepStatus, reason: Option<String>, lines: Vec<String>) {
        self.steps.push(StepRecord {
            seq: self.next_seq,
            section: step.section.clone(),
            title: step.title.clone(),
            probe: step.probe.clone(),
            status,
            reason,
            lines,
        });
        self.next_seq += 1;
    }

    /// Stamps the run and returns it.
    #[must_use]
    pub fn finish(self) -> RunReport {
        RunReport { recorded_at: Utc::now(), data_dir: self.data_dir, steps: self.steps }
    }
}

/// Writes `report` as YAML to `path`.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write(report: &RunReport, path: &Path) -> Result<(), std::io::Error> {
    let yaml = serde_yaml::to_string(report).map_err(std::io::Error::other)?;
    std::fs::write(path, yaml)
}
