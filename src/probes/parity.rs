//! One read, three calling conventions.
//!
//! `read_bytes` is the only implementation of the action. The adapters differ
//! solely in when the caller regains control:
//!
//! - [`using_sync_api`] blocks the calling thread until the read finishes;
//! - [`using_callback_api`] returns at once and later hands the report to a
//!   continuation, with no ordering relative to code after the call;
//! - [`using_future_api`] issues the read immediately and suspends only at
//!   its `.await`.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use super::{text, ProbeReport};
use crate::error::{IoResultExt, ProbeError};

const PRIMITIVE: &str = "readFile";

/// Reads the whole file, blocking the current thread.
///
/// # Errors
///
/// Returns the classified I/O error.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, ProbeError> {
    std::fs::read(path).during("open", path)
}

fn describe(mut report: ProbeReport, path: &Path, result: Result<Vec<u8>, ProbeError>) -> ProbeReport {
    let outcome = result.map(|data| {
        report.say(format!("content of {}: {}", path.display(), text(&data)));
    });
    report.conclude(outcome)
}

/// Reads `path` synchronously.
#[must_use]
pub fn using_sync_api(path: &Path) -> ProbeReport {
    describe(ProbeReport::new(PRIMITIVE), path, read_bytes(path))
}

/// Starts reading `path` and passes the report to `continuation` when done.
///
/// Must be called inside a Tokio runtime.
pub fn using_callback_api<F>(path: PathBuf, continuation: F) -> JoinHandle<()>
where
    F: FnOnce(ProbeReport) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = read_bytes(&path);
        continuation(describe(ProbeReport::new(PRIMITIVE), &path, result));
    })
}

/// Issues the read, does other work, then awaits the pending result.
pub async fn using_future_api(path: &Path) -> ProbeReport {
    let pending = tokio::task::spawn_blocking({
        let path = path.to_path_buf();
        move || read_bytes(&path)
    });

    let mut report = ProbeReport::new(PRIMITIVE);
    report.say("do something else");

    let result = match pending.await {
        Ok(result) => result,
        Err(join_err) => Err(ProbeError::Io(join_err.to_string())),
    };
    describe(report, path, result)
}
