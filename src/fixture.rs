//! Fixture tree seeding.
//!
//! `reset` is the only code that creates or destroys the scratch tree. The
//! resulting layout:
//!
//! ```text
//! <root>/
//!   ├── test1.txt
//!   ├── watchTest.txt
//!   ├── chmod.txt
//!   ├── test1-sym-link -> test1.txt
//!   └── docs/
//!       ├── readme.txt
//!       └── archive/
//!           └── old.txt
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FixtureError;

/// One seeded file: path relative to the root plus its exact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureFile {
    /// Path relative to the fixture root.
    pub path: &'static str,
    /// Initial contents.
    pub contents: &'static [u8],
}

/// Files written by every reset, in creation order.
pub const MANIFEST: &[FixtureFile] = &[
    FixtureFile { path: "test1.txt", contents: b"Here is some top secret data. " },
    FixtureFile { path: "watchTest.txt", contents: b"Test watching files" },
    FixtureFile { path: "chmod.txt", contents: b"Test access changes" },
    FixtureFile { path: "docs/readme.txt", contents: b"Directory listing target" },
    FixtureFile { path: "docs/archive/old.txt", contents: b"Archived notes" },
];

/// Name of the symbolic link created next to its target.
pub const SYMLINK_NAME: &str = "test1-sym-link";
/// Link target, relative to the link's own directory.
pub const SYMLINK_TARGET: &str = "test1.txt";

/// Describes a freshly seeded tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureTree {
    /// Root the tree was seeded under.
    pub root: PathBuf,
    /// Whether the platform allowed the symbolic link to be created.
    pub symlink_created: bool,
}

impl FixtureTree {
    /// Absolute-or-relative path of a fixture entry under the root.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Wipes `root` and seeds the fixture tree under it.
///
/// Idempotent: repeated calls leave the same shape behind.
///
/// # Errors
///
/// Any failure other than a privilege refusal on the symbolic link is fatal
/// and returned as [`FixtureError::Malformed`].
pub fn reset(root: &Path) -> Result<FixtureTree, FixtureError> {
    debug!(root = %root.display(), "resetting fixture tree");

    remove_existing(root)?;

    fs::create_dir_all(root).map_err(FixtureError::at(root))?;
    make_world_writable(root)?;

    for file in MANIFEST {
        let path = root.join(file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(FixtureError::at(parent))?;
        }
        fs::write(&path, file.contents).map_err(FixtureError::at(&path))?;
        debug!(path = %path.display(), bytes = file.contents.len(), "seeded fixture file");
    }

    let link = root.join(SYMLINK_NAME);
    let symlink_created = match symlink_file(Path::new(SYMLINK_TARGET), &link) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                link = %link.display(),
                error = %e,
                "symbolic links need elevated privilege here; continuing without one"
            );
            false
        }
        Err(e) => return Err(FixtureError::at(&link)(e)),
    };

    Ok(FixtureTree { root: root.to_path_buf(), symlink_created })
}

/// Removes whatever sits at `root`, file or directory; absence is fine.
fn remove_existing(root: &Path) -> Result<(), FixtureError> {
    let removed = match fs::symlink_metadata(root) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(root),
        Ok(_) => fs::remove_file(root),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FixtureError::at(root)(e)),
    }
}

/// Checks that every manifest entry under `root` holds exactly its bytes.
///
/// # Errors
///
/// Returns the first missing or mismatched entry.
pub fn verify(root: &Path) -> Result<(), FixtureError> {
    for file in MANIFEST {
        let path = root.join(file.path);
        let actual = fs::read(&path).map_err(FixtureError::at(&path))?;
        if actual != file.contents {
            return Err(FixtureError::ContentMismatch { path });
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_world_writable(root: &Path) -> Result<(), FixtureError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(root, fs::Permissions::from_mode(0o777)).map_err(FixtureError::at(root))
}

#[cfg(not(unix))]
fn make_world_writable(_root: &Path) -> Result<(), FixtureError> {
    Ok(())
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::PermissionDenied))
}
