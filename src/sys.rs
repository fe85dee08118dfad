//! Thin wrappers over host primitives that `std` does not expose portably.
//!
//! On non-Unix hosts every wrapper reports `ErrorKind::Unsupported`.

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Which access check `access(2)` should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// The entry exists and is visible to the caller.
    Visible,
    /// The caller may read the entry.
    Read,
    /// The caller may write the entry.
    Write,
    /// The caller may execute the entry.
    Execute,
}

/// Permission bits of `metadata`, or `None` where the host has no such notion.
#[must_use]
pub fn mode_bits(metadata: &Metadata) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(metadata.permissions().mode())
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        None
    }
}

#[cfg(unix)]
mod imp {
    use std::io;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    use rustix::fs::{Access, AtFlags, Timespec, Timestamps, CWD};

    use super::AccessMode;

    fn out_of_range<E>(_: E) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range")
    }

    fn timespec(time: SystemTime) -> io::Result<Timespec> {
        let since_epoch = time.duration_since(UNIX_EPOCH).map_err(out_of_range)?;
        Ok(Timespec {
            tv_sec: since_epoch.as_secs().try_into().map_err(out_of_range)?,
            tv_nsec: since_epoch.subsec_nanos().try_into().map_err(out_of_range)?,
        })
    }

    pub fn access(path: &Path, mode: AccessMode) -> io::Result<()> {
        let access = match mode {
            AccessMode::Visible => Access::EXISTS,
            AccessMode::Read => Access::READ_OK,
            AccessMode::Write => Access::WRITE_OK,
            AccessMode::Execute => Access::EXEC_OK,
        };
        rustix::fs::accessat(CWD, path, access, AtFlags::empty())?;
        Ok(())
    }

    pub fn set_times(
        path: &Path,
        atime: SystemTime,
        mtime: SystemTime,
        follow_links: bool,
    ) -> io::Result<()> {
        let times = Timestamps { last_access: timespec(atime)?, last_modification: timespec(mtime)? };
        let flags = if follow_links { AtFlags::empty() } else { AtFlags::SYMLINK_NOFOLLOW };
        rustix::fs::utimensat(CWD, path, &times, flags)?;
        Ok(())
    }

    pub fn chmod(path: &Path, mode: u32) -> io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    pub fn chown(path: &Path, uid: u32, gid: u32, follow_links: bool) -> io::Result<()> {
        if follow_links {
            std::os::unix::fs::chown(path, Some(uid), Some(gid))
        } else {
            std::os::unix::fs::lchown(path, Some(uid), Some(gid))
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;
    use std::path::Path;
    use std::time::SystemTime;

    use super::AccessMode;

    fn unsupported() -> io::Error {
        io::Error::from(io::ErrorKind::Unsupported)
    }

    pub fn access(path: &Path, mode: AccessMode) -> io::Result<()> {
        match mode {
            AccessMode::Visible | AccessMode::Read => std::fs::metadata(path).map(|_| ()),
            AccessMode::Write | AccessMode::Execute => Err(unsupported()),
        }
    }

    pub fn set_times(
        _path: &Path,
        _atime: SystemTime,
        _mtime: SystemTime,
        _follow_links: bool,
    ) -> io::Result<()> {
        Err(unsupported())
    }

    pub fn chmod(_path: &Path, _mode: u32) -> io::Result<()> {
        Err(unsupported())
    }

    pub fn chown(_path: &Path, _uid: u32, _gid: u32, _follow_links: bool) -> io::Result<()> {
        Err(unsupported())
    }
}

/// Checks the caller's access to `path` the way `access(2)` does.
///
/// # Errors
///
/// Returns the platform error when access is refused or the path is absent.
pub fn access(path: &Path, mode: AccessMode) -> io::Result<()> {
    imp::access(path, mode)
}

/// Sets access and modification times on the file `path` resolves to.
///
/// Only ownership of the file is needed, not read or write access.
///
/// # Errors
///
/// Returns the platform error from `utimensat(2)`.
pub fn set_times(path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
    imp::set_times(path, atime, mtime, true)
}

/// Sets access and modification times on the link entry itself.
///
/// # Errors
///
/// Returns the platform error from `utimensat(2)`.
pub fn set_link_times(path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
    imp::set_times(path, atime, mtime, false)
}

/// Replaces the permission bits of `path` (following links).
///
/// # Errors
///
/// Returns the platform error from `chmod(2)`.
pub fn chmod(path: &Path, mode: u32) -> io::Result<()> {
    imp::chmod(path, mode)
}

/// Changes owner and group, on the target or on the link entry itself.
///
/// # Errors
///
/// Returns the platform error from `chown(2)` or `lchown(2)`.
pub fn chown(path: &Path, uid: u32, gid: u32, follow_links: bool) -> io::Result<()> {
    imp::chown(path, uid, gid, follow_links)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn access_reports_missing_entries() {
        let temp = TempDir::new().unwrap();
        let err = access(&temp.path().join("nope"), AccessMode::Visible).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        access(temp.path(), AccessMode::Visible).unwrap();
    }

    #[test]
    fn link_times_leave_target_untouched() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target.txt");
        let link = temp.path().join("link");
        std::fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink("target.txt", &link).unwrap();
        let target_mtime = std::fs::metadata(&target).unwrap().modified().unwrap();

        let stamp = UNIX_EPOCH + Duration::from_secs(1_577_836_800);
        set_link_times(&link, stamp, stamp).unwrap();

        assert_eq!(std::fs::symlink_metadata(&link).unwrap().modified().unwrap(), stamp);
        assert_eq!(std::fs::metadata(&target).unwrap().modified().unwrap(), target_mtime);
    }

    #[test]
    fn set_times_follows_links_and_needs_no_read_access() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("chmod.txt");
        let link = temp.path().join("link");
        std::fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink("chmod.txt", &link).unwrap();
        chmod(&target, 0o200).unwrap();

        let stamp = UNIX_EPOCH + Duration::from_secs(1_577_836_800);
        set_times(&link, stamp, stamp).unwrap();

        assert_eq!(std::fs::metadata(&target).unwrap().modified().unwrap(), stamp);
        assert_ne!(std::fs::symlink_metadata(&link).unwrap().modified().unwrap(), stamp);
    }

    #[test]
    fn execute_access_is_refused_without_execute_bits() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chmod.txt");
        std::fs::write(&path, "x").unwrap();
        chmod(&path, 0o200).unwrap();

        let err = access(&path, AccessMode::Execute).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn chmod_replaces_mode_bits() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chmod.txt");
        std::fs::write(&path, "x").unwrap();

        chmod(&path, 0o500).unwrap();

        let mode = mode_bits(&std::fs::metadata(&path).unwrap()).unwrap();
        assert_eq!(mode & 0o777, 0o500);
    }
}
