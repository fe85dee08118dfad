//! Cancellation signals for pending filesystem operations.
//!
//! An [`AbortController`] hands out [`AbortSignal`]s; aborting the controller
//! wakes every pending operation holding a signal. Aborting is idempotent and
//! has no effect on operations that already resolved.

use std::path::Path;

use tokio::sync::watch;

use crate::error::{IoResultExt, ProbeError};

/// Owner side of a cancellation pair.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

/// Observer side of a cancellation pair, handed to pending operations.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortController {
    /// Creates a controller whose signal is not yet aborted.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Returns a signal tied to this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal { rx: self.tx.subscribe() }
    }

    /// Aborts every operation observing this controller's signals.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortSignal {
    /// Returns `true` once the controller has aborted.
    #[must_use]
    pub fn aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the controller aborts.
    ///
    /// Never resolves if the controller is dropped without aborting.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Reads `path` unless `signal` aborts first.
///
/// The abort check wins ties: a signal aborted before this future is first
/// polled always yields [`ProbeError::Cancelled`].
///
/// # Errors
///
/// Returns [`ProbeError::Cancelled`] on abort, or the classified I/O error.
pub async fn read_with_signal(path: &Path, signal: &AbortSignal) -> Result<Vec<u8>, ProbeError> {
    if signal.aborted() {
        return Err(ProbeError::Cancelled);
    }
    tokio::select! {
        biased;
        () = signal.cancelled() => Err(ProbeError::Cancelled),
        result = tokio::fs::read(path) => result.during("open", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn abort_flips_every_signal() {
        let controller = AbortController::new();
        let first = controller.signal();
        let second = controller.signal();
        assert!(!first.aborted());

        controller.abort();
        controller.abort();

        assert!(first.aborted());
        assert!(second.aborted());
    }

    #[tokio::test]
    async fn abort_before_resolution_cancels_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test1.txt");
        std::fs::write(&path, "Here is some top secret data. ").unwrap();

        let controller = AbortController::new();
        let signal = controller.signal();
        let pending = read_with_signal(&path, &signal);
        controller.abort();

        assert_eq!(pending.await, Err(ProbeError::Cancelled));
    }

    #[tokio::test]
    async fn abort_while_read_is_in_flight_cancels_it() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test1.txt");
        std::fs::write(&path, "Here is some top secret data. ").unwrap();

        let controller = AbortController::new();
        let signal = controller.signal();
        let mut pending = std::pin::pin!(read_with_signal(&path, &signal));

        // One poll issues the read on the blocking pool and parks the future.
        let first_poll_finished = tokio::select! {
            biased;
            _ = &mut pending => true,
            () = std::future::ready(()) => false,
        };
        assert!(!first_poll_finished);

        controller.abort();
        assert_eq!(pending.await, Err(ProbeError::Cancelled));
    }

    #[tokio::test]
    async fn abort_after_resolution_has_no_effect() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test1.txt");
        std::fs::write(&path, "kept").unwrap();

        let controller = AbortController::new();
        let signal = controller.signal();
        let result = read_with_signal(&path, &signal).await;
        controller.abort();

        assert_eq!(result, Ok(b"kept".to_vec()));
    }

    #[tokio::test]
    async fn io_failure_is_not_reported_as_cancellation() {
        let temp = TempDir::new().unwrap();
        let controller = AbortController::new();

        let err = read_with_signal(&temp.path().join("missing.txt"), &controller.signal())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "not_found");
        assert_ne!(err, ProbeError::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_resolves_after_abort_from_another_task() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let waiter = tokio::spawn(async move { signal.cancelled().await });
        tokio::task::yield_now().await;

        controller.abort();
        waiter.await.unwrap();
    }
}
