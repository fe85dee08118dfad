//! Probes for hard and symbolic links.
//!
//! Metadata probes here act on the link entry itself (no-follow), unlike
//! their counterparts in [`super::metadata`] which act on the link target.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;

use super::metadata::narrate_times;
use super::{blocking, ProbeReport};
use crate::error::{IoResultExt, ProbeError};
use crate::sys;

/// Creates a hard link `new_path` to `existing`.
pub async fn create_hard_link(existing: &Path, new_path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("link");
    let outcome = async {
        fs::hard_link(existing, new_path).await.during("link", new_path)?;
        report.say(format!(
            "created a hard link at '{}' linked to {}",
            new_path.display(),
            existing.display()
        ));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Creates a symbolic link at `path` whose stored target is `target`.
///
/// `target` is stored verbatim, so a relative target resolves against the
/// link's own directory.
pub async fn create_soft_link(target: &Path, path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("symlink");
    let outcome = async {
        symlink(target, path).await.during("symlink", path)?;
        report.say(format!(
            "created a soft (symbolic) link at {} pointing to {}",
            path.display(),
            target.display()
        ));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

#[cfg(unix)]
async fn symlink(target: &Path, path: &Path) -> std::io::Result<()> {
    fs::symlink(target, path).await
}

#[cfg(windows)]
async fn symlink(target: &Path, path: &Path) -> std::io::Result<()> {
    fs::symlink_file(target, path).await
}

/// Prints the stored target of the symbolic link at `path`.
pub async fn read_soft_link(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readlink");
    let outcome = async {
        let target = fs::read_link(path).await.during("readlink", path)?;
        report.say(format!("symbolic link {} points to {}", path.display(), target.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Sets the timestamps of the link entry, leaving its target alone.
pub async fn update_soft_link_timestamp(
    path: &Path,
    access_time: DateTime<Utc>,
    modify_time: DateTime<Utc>,
) -> ProbeReport {
    let mut report = ProbeReport::new("lutimes");
    let outcome = async {
        let metadata = fs::symlink_metadata(path).await.during("lstat", path)?;
        narrate_times(&mut report, path, &metadata);

        let target = path.to_path_buf();
        blocking(move || {
            sys::set_link_times(&target, SystemTime::from(access_time), SystemTime::from(modify_time))
        })
        .await
        .during("lutime", path)?;

        report.say(format!(
            "updated access and modified timestamp on {} to {access_time} and {modify_time} respectively",
            path.display()
        ));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Tries to change the mode bits of the link entry itself.
///
/// The host offers no such primitive, so this always reports
/// [`ProbeError::Unsupported`].
pub async fn update_link_permissions(path: &Path, mode: u32) -> ProbeReport {
    let mut report = ProbeReport::new("lchmod");
    report.say(format!("set {mode:05o} permissions on {}", path.display()));
    let outcome = fs::symlink_metadata(path)
        .await
        .during("lstat", path)
        .and_then(|_| Err(ProbeError::unsupported("lchmod")));
    report.conclude(outcome)
}

/// Changes owner and group of the link entry itself.
pub async fn update_link_owner(path: &Path, uid: u32, gid: u32) -> ProbeReport {
    let mut report = ProbeReport::new("lchown");
    let outcome = async {
        let target = path.to_path_buf();
        blocking(move || sys::chown(&target, uid, gid, false)).await.during("lchown", path)?;
        report.say(format!("changed ownership of {}, uid = {uid}, gid = {gid}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Removes the link entry at `path`.
pub async fn remove_link(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("unlink");
    let outcome = async {
        fs::remove_file(path).await.during("unlink", path)?;
        report.say(format!("removed {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}
