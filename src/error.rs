//! Error taxonomy shared by probes and the fixture reset.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A classified failure observed by a probe.
///
/// Every variant carries the human-readable description produced by the
/// platform, with the operation and path appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The target path is absent.
    #[error("{0}")]
    NotFound(String),
    /// The caller lacks rights for the requested action.
    #[error("{0}")]
    PermissionDenied(String),
    /// An exclusive create collided with an existing entry.
    #[error("{0}")]
    AlreadyExists(String),
    /// The operation has no meaning or implementation on this host.
    #[error("{0}")]
    Unsupported(String),
    /// The caller withdrew interest before the operation completed.
    #[error("The operation was aborted")]
    Cancelled,
    /// Any other I/O failure.
    #[error("{0}")]
    Io(String),
}

impl ProbeError {
    /// Classifies an I/O error raised while running `op` against `path`.
    #[must_use]
    pub fn from_io(err: &io::Error, op: &str, path: &Path) -> Self {
        let message = format!("{err}, {op} '{}'", path.display());
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(message),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(message),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(message),
            io::ErrorKind::Unsupported => Self::Unsupported(message),
            _ => Self::Io(message),
        }
    }

    /// Builds an `Unsupported` error for a primitive the host does not offer.
    #[must_use]
    pub fn unsupported(op: &str) -> Self {
        Self::Unsupported(format!("The {op}() method is not implemented"))
    }

    /// Short machine-readable tag for the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::AlreadyExists(_) => "already_exists",
            Self::Unsupported(_) => "unsupported",
            Self::Cancelled => "cancelled",
            Self::Io(_) => "io",
        }
    }
}

/// Attaches the operation name and path to an `io::Result`.
pub trait IoResultExt<T> {
    /// Converts the error side into a classified [`ProbeError`].
    ///
    /// # Errors
    ///
    /// Returns the classified error when `self` is `Err`.
    fn during(self, op: &str, path: &Path) -> Result<T, ProbeError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn during(self, op: &str, path: &Path) -> Result<T, ProbeError> {
        self.map_err(|err| ProbeError::from_io(&err, op, path))
    }
}

/// A fatal failure while seeding or checking the fixture tree.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// A filesystem step of the reset failed.
    #[error("failed to reset fixture at {}: {source}", path.display())]
    Malformed {
        /// Path the failing step operated on.
        path: PathBuf,
        /// Underlying platform error.
        #[source]
        source: io::Error,
    },
    /// A manifest entry exists but holds different bytes.
    #[error("fixture entry {} does not hold its seeded contents", path.display())]
    ContentMismatch {
        /// Path of the mismatched entry.
        path: PathBuf,
    },
}

impl FixtureError {
    pub(crate) fn at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Malformed { path: path.to_path_buf(), source }
    }
}
