//! The probe invoked by a script step, with its fixture-relative arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::ProbeError;
use crate::probes::{directories, files, links, metadata, parity, ProbeReport};

/// One probe invocation. Paths are relative to the fixture root; an empty
/// path names the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "probe", rename_all = "snake_case")]
pub enum Probe {
    /// Read through the future-returning adapter.
    ReadWithFuture {
        /// File to read.
        path: String,
    },
    /// Read through the continuation adapter, awaited via a channel.
    ReadWithCallback {
        /// File to read.
        path: String,
    },
    /// Read through the blocking adapter.
    ReadSync {
        /// File to read.
        path: String,
    },
    /// Open read-only and report the descriptor.
    Open {
        /// Entry to open.
        path: String,
    },
    /// Read a whole file.
    Read {
        /// File to read.
        path: String,
    },
    /// Read through an append-only handle.
    ReadInAppendMode {
        /// File to read.
        path: String,
    },
    /// Open write-only with create and truncate, then read.
    ReadCreateFirst {
        /// File to create and read.
        path: String,
    },
    /// Read as base64 and decode back.
    ReadAsBase64 {
        /// File to read.
        path: String,
    },
    /// Read, aborting before the result is awaited.
    ReadCancelled {
        /// File to read.
        path: String,
    },
    /// Copy, replacing the destination.
    Copy {
        /// Source file.
        src: String,
        /// Destination file.
        dest: String,
    },
    /// Copy only if the destination is absent.
    CopyExclusive {
        /// Source file.
        src: String,
        /// Destination file.
        dest: String,
    },
    /// Append text, creating the file if needed.
    Append {
        /// File to append to.
        path: String,
        /// Text to append.
        data: String,
    },
    /// Write text, creating or replacing the file.
    Write {
        /// File to write.
        path: String,
        /// Text to write.
        data: String,
    },
    /// Replace an existing file's content, showing before and after.
    WriteOverwrite {
        /// File to overwrite.
        path: String,
        /// Replacement text.
        data: String,
    },
    /// Truncate to a byte length.
    Truncate {
        /// File to truncate.
        path: String,
        /// Bytes to keep.
        length: u64,
    },
    /// Watch for changes while the file is deleted.
    Watch {
        /// File to watch.
        path: String,
    },
    /// Print the stat size.
    FileSize {
        /// Entry to stat.
        path: String,
    },
    /// Print the whole stat record.
    AllStats {
        /// Entry to stat.
        path: String,
    },
    /// Check visibility.
    Access {
        /// Entry to check.
        path: String,
    },
    /// Drop execute bits and check execute access.
    ExecuteAccess {
        /// Entry to check.
        path: String,
    },
    /// Replace permission bits.
    Chmod {
        /// Entry to change.
        path: String,
        /// New mode bits.
        mode: u32,
    },
    /// Change owner of the link target.
    Chown {
        /// Entry to change.
        path: String,
        /// New owner.
        uid: u32,
        /// New group.
        gid: u32,
    },
    /// Set timestamps on the link target.
    Utimes {
        /// Entry to change.
        path: String,
        /// New access time.
        atime: DateTime<Utc>,
        /// New modification time.
        mtime: DateTime<Utc>,
    },
    /// Resolve to a canonical path.
    RealPath {
        /// Entry to resolve.
        path: String,
    },
    /// Create a hard link.
    HardLink {
        /// Existing file.
        existing: String,
        /// New link path.
        new_path: String,
    },
    /// Create a symbolic link; `target` is stored verbatim.
    SoftLink {
        /// Stored link target.
        target: String,
        /// New link path.
        path: String,
    },
    /// Print a symbolic link's stored target.
    ReadLink {
        /// Link to read.
        path: String,
    },
    /// Set timestamps on the link entry itself.
    LinkUtimes {
        /// Link to change.
        path: String,
        /// New access time.
        atime: DateTime<Utc>,
        /// New modification time.
        mtime: DateTime<Utc>,
    },
    /// Change owner of the link entry itself.
    LinkChown {
        /// Link to change.
        path: String,
        /// New owner.
        uid: u32,
        /// New group.
        gid: u32,
    },
    /// Change mode bits of the link entry itself.
    LinkChmod {
        /// Link to change.
        path: String,
        /// New mode bits.
        mode: u32,
    },
    /// Remove a link entry.
    Unlink {
        /// Link to remove.
        path: String,
    },
    /// Create a directory with parents.
    Mkdir {
        /// Directory to create.
        path: String,
    },
    /// Create a uniquely named directory.
    Mkdtemp {
        /// Name prefix.
        prefix: String,
    },
    /// List a directory, sorted.
    ReadDir {
        /// Directory to list.
        path: String,
    },
    /// Walk a directory handle.
    OpenDir {
        /// Directory to open.
        path: String,
    },
    /// Rename an entry.
    Rename {
        /// Current path.
        from: String,
        /// New path.
        to: String,
    },
    /// Remove an empty directory.
    Rmdir {
        /// Directory to remove.
        path: String,
    },
    /// Remove anything, recursively.
    Rm {
        /// Entry to remove.
        path: String,
    },
}

/// Resolves a fixture-relative path; empty means the root.
#[must_use]
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

impl Probe {
    /// Primitive name shown in listings.
    #[must_use]
    pub fn primitive(&self) -> &'static str {
        match self {
            Self::ReadWithFuture { .. }
            | Self::ReadWithCallback { .. }
            | Self::ReadSync { .. }
            | Self::Read { .. }
            | Self::ReadInAppendMode { .. }
            | Self::ReadCreateFirst { .. }
            | Self::ReadAsBase64 { .. }
            | Self::ReadCancelled { .. } => "readFile",
            Self::Open { .. } => "open",
            Self::Copy { .. } | Self::CopyExclusive { .. } => "copyFile",
            Self::Append { .. } => "appendFile",
            Self::Write { .. } | Self::WriteOverwrite { .. } => "writeFile",
            Self::Truncate { .. } => "truncate",
            Self::Watch { .. } => "watch",
            Self::FileSize { .. } | Self::AllStats { .. } => "stat",
            Self::Access { .. } | Self::ExecuteAccess { .. } => "access",
            Self::Chmod { .. } => "chmod",
            Self::Chown { .. } => "chown",
            Self::Utimes { .. } => "utimes",
            Self::RealPath { .. } => "realpath",
            Self::HardLink { .. } => "link",
            Self::SoftLink { .. } => "symlink",
            Self::ReadLink { .. } => "readlink",
            Self::LinkUtimes { .. } => "lutimes",
            Self::LinkChown { .. } => "lchown",
            Self::LinkChmod { .. } => "lchmod",
            Self::Unlink { .. } => "unlink",
            Self::Mkdir { .. } => "mkdir",
            Self::Mkdtemp { .. } => "mkdtemp",
            Self::ReadDir { .. } => "readdir",
            Self::OpenDir { .. } => "opendir",
            Self::Rename { .. } => "rename",
            Self::Rmdir { .. } => "rmdir",
            Self::Rm { .. } => "rm",
        }
    }

    /// Runs the probe against the tree rooted at `root`.
    pub async fn run(&self, root: &Path, watch_duration: Duration) -> ProbeReport {
        let at = |rel: &str| resolve(root, rel);
        match self {
            Self::ReadWithFuture { path } => parity::using_future_api(&at(path)).await,
            Self::ReadWithCallback { path } => read_with_callback(at(path)).await,
            Self::ReadSync { path } => parity::using_sync_api(&at(path)),
            Self::Open { path } => files::open_file(&at(path)).await,
            Self::Read { path } => files::read_file(&at(path)).await,
            Self::ReadInAppendMode { path } => files::read_file_in_append_mode(&at(path)).await,
            Self::ReadCreateFirst { path } => files::read_file_create_first(&at(path)).await,
            Self::ReadAsBase64 { path } => files::read_file_as_base64(&at(path)).await,
            Self::ReadCancelled { path } => files::read_file_cancelled(&at(path)).await,
            Self::Copy { src, dest } => files::copy_file(&at(src), &at(dest)).await,
            Self::CopyExclusive { src, dest } => {
                files::copy_file_exclusive(&at(src), &at(dest)).await
            }
            Self::Append { path, data } => files::append_file(&at(path), data).await,
            Self::Write { path, data } => files::write_file(&at(path), data).await,
            Self::WriteOverwrite { path, data } => {
                files::write_file_overwrite(&at(path), data).await
            }
            Self::Truncate { path, length } => files::truncate_file(&at(path), *length).await,
            Self::Watch { path } => files::watch_file(&at(path), watch_duration).await,
            Self::FileSize { path } => metadata::read_file_size(&at(path)).await,
            Self::AllStats { path } => metadata::read_all_stats(&at(path)).await,
            Self::Access { path } => metadata::test_file_access(&at(path)).await,
            Self::ExecuteAccess { path } => metadata::test_file_execute_access(&at(path)).await,
            Self::Chmod { path, mode } => metadata::update_file_permissions(&at(path), *mode).await,
            Self::Chown { path, uid, gid } => {
                metadata::update_file_owner(&at(path), *uid, *gid).await
            }
            Self::Utimes { path, atime, mtime } => {
                metadata::update_file_timestamp(&at(path), *atime, *mtime).await
            }
            Self::RealPath { path } => metadata::get_real_path(&at(path)).await,
            Self::HardLink { existing, new_path } => {
                links::create_hard_link(&at(existing), &at(new_path)).await
            }
            Self::SoftLink { target, path } => {
                links::create_soft_link(Path::new(target), &at(path)).await
            }
            Self::ReadLink { path } => links::read_soft_link(&at(path)).await,
            Self::LinkUtimes { path, atime, mtime } => {
                links::update_soft_link_timestamp(&at(path), *atime, *mtime).await
            }
            Self::LinkChown { path, uid, gid } => {
                links::update_link_owner(&at(path), *uid, *gid).await
            }
            Self::LinkChmod { path, mode } => links::update_link_permissions(&at(path), *mode).await,
            Self::Unlink { path } => links::remove_link(&at(path)).await,
            Self::Mkdir { path } => directories::create_directory(&at(path)).await,
            Self::Mkdtemp { prefix } => directories::create_temp_directory(&at(prefix)).await,
            Self::ReadDir { path } => directories::read_directory(&at(path)).await,
            Self::OpenDir { path } => directories::open_directory(&at(path)).await,
            Self::Rename { from, to } => directories::rename_entry(&at(from), &at(to)).await,
            Self::Rmdir { path } => directories::remove_directory(&at(path)).await,
            Self::Rm { path } => directories::remove_entry(&at(path)).await,
        }
    }
}

async fn read_with_callback(path: PathBuf) -> ProbeReport {
    let (tx, rx) = oneshot::channel();
    parity::using_callback_api(path, move |report| {
        let _ = tx.send(report);
    });
    match rx.await {
        Ok(report) => report,
        Err(_) => ProbeReport::new("readFile")
            .conclude(Err(ProbeError::Io("continuation was never invoked".to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_relative_path_is_root() {
        let root = Path::new("./data");
        assert_eq!(resolve(root, ""), PathBuf::from("./data"));
        assert_eq!(resolve(root, "docs/readme.txt"), PathBuf::from("./data/docs/readme.txt"));
    }

    #[test]
    fn serializes_with_probe_tag() {
        let probe = Probe::Truncate { path: "test1.txt".into(), length: 29 };
        let yaml = serde_yaml::to_string(&probe).unwrap();
        assert!(yaml.contains("probe: truncate"));
        assert!(yaml.contains("length: 29"));
        assert_eq!(probe.primitive(), "truncate");
    }

    #[tokio::test]
    async fn runs_against_root_relative_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("test1.txt"), "abc").unwrap();

        let report = Probe::ReadWithCallback { path: "test1.txt".into() }
            .run(temp.path(), Duration::from_millis(10))
            .await;

        assert_eq!(
            report.lines(),
            [format!("content of {}: abc", temp.path().join("test1.txt").display())]
        );
    }
}
