//! Probes that read or change file metadata.

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;

use super::{blocking, ProbeReport};
use crate::error::{IoResultExt, ProbeError};
use crate::sys::{self, AccessMode};

/// Serializable view of a stat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatSnapshot {
    /// Device id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<u64>,
    /// Inode number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ino: Option<u64>,
    /// Full mode in octal, including the file type bits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Hard link count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlink: Option<u64>,
    /// Owner user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Owner group id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    /// Size in bytes.
    pub size: u64,
    /// Whether the entry is a regular file.
    pub is_file: bool,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Whether the entry is a symbolic link (only for no-follow stats).
    pub is_symlink: bool,
    /// Last access time.
    pub atime: Option<DateTime<Utc>>,
    /// Last modification time.
    pub mtime: Option<DateTime<Utc>>,
    /// Creation time, where the platform records one.
    pub birthtime: Option<DateTime<Utc>>,
}

impl StatSnapshot {
    /// Captures the fields of `metadata`.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let stamp = |t: std::io::Result<SystemTime>| t.ok().map(DateTime::<Utc>::from);
        let mut snapshot = Self {
            dev: None,
            ino: None,
            mode: None,
            nlink: None,
            uid: None,
            gid: None,
            size: metadata.len(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            is_symlink: metadata.file_type().is_symlink(),
            atime: stamp(metadata.accessed()),
            mtime: stamp(metadata.modified()),
            birthtime: stamp(metadata.created()),
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            snapshot.dev = Some(metadata.dev());
            snapshot.ino = Some(metadata.ino());
            snapshot.mode = Some(format!("{:o}", metadata.mode()));
            snapshot.nlink = Some(metadata.nlink());
            snapshot.uid = Some(metadata.uid());
            snapshot.gid = Some(metadata.gid());
        }
        snapshot
    }
}

/// Prints the stat size of `path`.
pub async fn read_file_size(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("stat");
    let outcome = async {
        let metadata = fs::metadata(path).await.during("stat", path)?;
        report.say(format!("size of {} is {} bytes", path.display(), metadata.len()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Prints every stat field of `path` as pretty JSON.
pub async fn read_all_stats(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("stat");
    let outcome = async {
        let metadata = fs::metadata(path).await.during("stat", path)?;
        let json = serde_json::to_string_pretty(&StatSnapshot::from_metadata(&metadata))
            .map_err(|e| ProbeError::Io(e.to_string()))?;
        report.say(format!("stats for {}:", path.display()));
        for line in json.lines() {
            report.say(line);
        }
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Checks that `path` is visible to the caller.
pub async fn test_file_access(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("access");
    let outcome = async {
        let target = path.to_path_buf();
        blocking(move || sys::access(&target, AccessMode::Visible)).await.during("access", path)?;
        report.say(format!("{} is visible", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Makes `path` write-only, then checks execute access (expected to fail).
pub async fn test_file_execute_access(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("access");
    let outcome = async {
        report.say(format!("remove execute access from {}", path.display()));
        let target = path.to_path_buf();
        blocking(move || {
            sys::chmod(&target, 0o200)?;
            sys::access(&target, AccessMode::Execute)
        })
        .await
        .during("access", path)?;
        report.say(format!("{} is executable", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Replaces the permission bits of `path` and prints the resulting mode.
pub async fn update_file_permissions(path: &Path, mode: u32) -> ProbeReport {
    let mut report = ProbeReport::new("chmod");
    let outcome = async {
        report.say(format!("set {mode:05o} permissions on {}", path.display()));
        let target = path.to_path_buf();
        blocking(move || sys::chmod(&target, mode)).await.during("chmod", path)?;
        let metadata = fs::metadata(path).await.during("stat", path)?;
        let shown = sys::mode_bits(&metadata).map_or_else(|| "unknown".to_string(), |m| format!("{m:o}"));
        report.say(format!("mode for {}: {shown}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Changes owner and group of the file `path` resolves to.
pub async fn update_file_owner(path: &Path, uid: u32, gid: u32) -> ProbeReport {
    let mut report = ProbeReport::new("chown");
    let outcome = async {
        let target = path.to_path_buf();
        blocking(move || sys::chown(&target, uid, gid, true)).await.during("chown", path)?;
        report.say(format!("changed ownership of {}, uid = {uid}, gid = {gid}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Prints the current timestamps of `path`, then sets both.
pub async fn update_file_timestamp(
    path: &Path,
    access_time: DateTime<Utc>,
    modify_time: DateTime<Utc>,
) -> ProbeReport {
    let mut report = ProbeReport::new("utimes");
    let outcome = async {
        let metadata = fs::metadata(path).await.during("stat", path)?;
        narrate_times(&mut report, path, &metadata);

        let target = path.to_path_buf();
        blocking(move || {
            sys::set_times(&target, SystemTime::from(access_time), SystemTime::from(modify_time))
        })
        .await
        .during("utime", path)?;

        report.say(format!(
            "updated access and modified timestamp on {} to {access_time} and {modify_time} respectively",
            path.display()
        ));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

pub(crate) fn narrate_times(report: &mut ProbeReport, path: &Path, metadata: &Metadata) {
    let show = |t: std::io::Result<SystemTime>| {
        t.map_or_else(|_| "unavailable".to_string(), |t| DateTime::<Utc>::from(t).to_string())
    };
    report.say(format!("access time for {} before update: {}", path.display(), show(metadata.accessed())));
    report.say(format!("modify time for {} before update: {}", path.display(), show(metadata.modified())));
}

/// Resolves `path` to its canonical absolute form.
pub async fn get_real_path(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("realpath");
    let outcome = async {
        let real = fs::canonicalize(path).await.during("realpath", path)?;
        report.say(format!("real path of {} is {}", path.display(), real.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}
