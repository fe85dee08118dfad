//! Single-purpose probes of filesystem primitives.
//!
//! Every probe runs one semantic action, narrates what it observed into a
//! [`ProbeReport`] and never propagates a failure: the caller decides what to
//! do with the report.

pub mod directories;
pub mod files;
pub mod links;
pub mod metadata;
pub mod parity;

use std::borrow::Cow;

use crate::error::ProbeError;

/// Narration and outcome of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    primitive: &'static str,
    lines: Vec<String>,
    failure: Option<ProbeError>,
}

impl ProbeReport {
    /// Starts an empty report for `primitive`.
    #[must_use]
    pub fn new(primitive: &'static str) -> Self {
        Self { primitive, lines: Vec::new(), failure: None }
    }

    /// Appends one narration line.
    pub fn say(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Records the final outcome and returns the finished report.
    #[must_use]
    pub fn conclude(mut self, result: Result<(), ProbeError>) -> Self {
        self.failure = result.err();
        self
    }

    /// Name of the primitive the probe exercised.
    #[must_use]
    pub fn primitive(&self) -> &'static str {
        self.primitive
    }

    /// Narration lines, excluding the failure.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The classified failure, if the probe failed.
    #[must_use]
    pub fn failure(&self) -> Option<&ProbeError> {
        self.failure.as_ref()
    }

    /// `true` when no failure was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Narration followed by the failure line, as it is shown to the user.
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        let mut out = self.lines.clone();
        if let Some(failure) = &self.failure {
            out.push(format!("Error: {failure}"));
        }
        out
    }
}

/// Renders file bytes as text the way the demo prints them.
pub(crate) fn text(data: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(data)
}

/// Runs a blocking primitive on Tokio's blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> std::io::Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(std::io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_appends_failure_line() {
        let mut report = ProbeReport::new("open");
        report.say("started");
        let report = report.conclude(Err(ProbeError::Cancelled));

        assert!(!report.is_success());
        assert_eq!(report.lines(), ["started"]);
        assert_eq!(report.rendered(), ["started", "Error: The operation was aborted"]);
    }

    #[test]
    fn successful_report_renders_only_narration() {
        let mut report = ProbeReport::new("stat");
        report.say("size of x is 3 bytes");
        let report = report.conclude(Ok(()));

        assert!(report.is_success());
        assert_eq!(report.primitive(), "stat");
        assert_eq!(report.rendered(), ["size of x is 3 bytes"]);
    }
}
