//! Probes for creating, listing, renaming and removing directories.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::ProbeReport;
use crate::error::{IoResultExt, ProbeError};

const TEMP_SUFFIX_LEN: usize = 6;

/// Opens a directory handle and walks its entries in host order.
pub async fn open_directory(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("opendir");
    let outcome = async {
        let mut dir = fs::read_dir(path).await.during("opendir", path)?;
        report.say(format!("opened directory {}", path.display()));
        while let Some(entry) = dir.next_entry().await.during("readdir", path)? {
            report.say(format!("entry: {}", entry.file_name().to_string_lossy()));
        }
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Lists a directory's entries, sorted by name, with their kinds.
pub async fn read_directory(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readdir");
    let outcome = async {
        let mut dir = fs::read_dir(path).await.during("scandir", path)?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.during("scandir", path)? {
            let kind = entry.file_type().await.during("scandir", &entry.path())?;
            let label = if kind.is_dir() {
                "dir"
            } else if kind.is_symlink() {
                "link"
            } else {
                "file"
            };
            entries.push((entry.file_name().to_string_lossy().into_owned(), label));
        }
        entries.sort();

        report.say(format!("{} contains {} entries:", path.display(), entries.len()));
        for (name, label) in entries {
            report.say(format!("[{label}] {name}"));
        }
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Creates `path` and any missing parents.
pub async fn create_directory(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("mkdir");
    let outcome = async {
        fs::create_dir_all(path).await.during("mkdir", path)?;
        report.say(format!("created directory {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Creates a uniquely named directory whose name starts with `prefix`.
pub async fn create_temp_directory(prefix: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("mkdtemp");
    let outcome = async {
        let path = unique_path(prefix);
        fs::create_dir(&path).await.during("mkdtemp", &path)?;
        report.say(format!("created temporary directory {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

fn unique_path(prefix: &Path) -> PathBuf {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(TEMP_SUFFIX_LEN).collect();
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Renames a file or directory.
pub async fn rename_entry(old_path: &Path, new_path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("rename");
    let outcome = async {
        fs::rename(old_path, new_path).await.during("rename", old_path)?;
        report.say(format!("renamed {} to {}", old_path.display(), new_path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Removes an empty directory; a non-empty one is reported as a failure.
pub async fn remove_directory(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("rmdir");
    let outcome = async {
        fs::remove_dir(path).await.during("rmdir", path)?;
        report.say(format!("removed directory {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Removes `path` whatever it is, recursively; a missing path is not an error.
pub async fn remove_entry(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("rm");
    let outcome = async {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.say(format!("nothing to remove at {}", path.display()));
                return Ok(());
            }
            Err(e) => return Err(ProbeError::from_io(&e, "lstat", path)),
        };
        if metadata.is_dir() {
            fs::remove_dir_all(path).await.during("rm", path)?;
        } else {
            fs::remove_file(path).await.during("rm", path)?;
        }
        report.say(format!("removed {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}
