//! Probes for opening, reading, writing and watching regular files.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::{blocking, text, ProbeReport};
use crate::cancel::{read_with_signal, AbortController};
use crate::error::{IoResultExt, ProbeError};

/// Opens `path` read-only and reports the descriptor.
pub async fn open_file(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("open");
    let outcome = async {
        let file = fs::File::open(path).await.during("open", path)?;
        report.say(format!("opened {}, {}", path.display(), descriptor(&file)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

#[cfg(unix)]
fn descriptor(file: &fs::File) -> String {
    use std::os::unix::io::AsRawFd;
    format!("file descriptor is {}", file.as_raw_fd())
}

#[cfg(not(unix))]
fn descriptor(_file: &fs::File) -> String {
    "file handle acquired".to_string()
}

/// Reads the whole file and prints it.
pub async fn read_file(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readFile");
    let outcome = async {
        let data = fs::read(path).await.during("open", path)?;
        report.say(format!("content of {}: {}", path.display(), text(&data)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Opens `path` append-only and tries to read from it.
///
/// The read is expected to fail: the handle carries no read access.
pub async fn read_file_in_append_mode(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readFile");
    let outcome = async {
        let mut file =
            fs::OpenOptions::new().append(true).open(path).await.during("open", path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await.during("read", path)?;
        report.say(format!("content of {}: {}", path.display(), text(&data)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Opens `path` write-only, creating or emptying it, and tries to read it.
///
/// The file exists and is empty afterwards; the read itself fails because
/// the handle carries no read access.
pub async fn read_file_create_first(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readFile");
    let outcome = async {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .during("open", path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await.during("read", path)?;
        report.say(format!("content of {}: {}", path.display(), text(&data)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Reads the file as base64 text, then decodes it back.
pub async fn read_file_as_base64(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readFile");
    let outcome = async {
        let data = fs::read(path).await.during("open", path)?;
        let encoded = STANDARD.encode(&data);
        report.say(format!("content of {}: {encoded}", path.display()));
        let decoded = STANDARD.decode(&encoded).map_err(|e| ProbeError::Io(e.to_string()))?;
        report.say(format!("convert base64 file content back to an ASCII string: {}", text(&decoded)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Starts a read on its own task, aborts it while it is in flight, then
/// awaits it.
///
/// The report fails with [`ProbeError::Cancelled`].
pub async fn read_file_cancelled(path: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("readFile");
    let controller = AbortController::new();

    let pending = tokio::spawn({
        let (path, signal) = (path.to_path_buf(), controller.signal());
        async move { read_with_signal(&path, &signal).await }
    });
    // Let the task issue the read before aborting it.
    tokio::task::yield_now().await;
    report.say(format!("started reading file: {}", path.display()));
    controller.abort();

    let outcome = match pending.await {
        Ok(result) => result.map(|data| {
            report.say(format!("content of {}: {}", path.display(), text(&data)));
        }),
        Err(join_err) => Err(ProbeError::Io(join_err.to_string())),
    };
    report.conclude(outcome)
}

/// Copies `src` over `dest`, replacing any existing destination.
pub async fn copy_file(src: &Path, dest: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("copyFile");
    let outcome = async {
        fs::copy(src, dest).await.during("copyfile", src)?;
        report.say(format!("file copied from {} to {}", src.display(), dest.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Copies `src` to `dest` only if `dest` does not exist yet.
///
/// An existing destination yields [`ProbeError::AlreadyExists`] and is left
/// byte-for-byte unchanged.
pub async fn copy_file_exclusive(src: &Path, dest: &Path) -> ProbeReport {
    let mut report = ProbeReport::new("copyFile");
    let outcome = async {
        let (from, to) = (src.to_path_buf(), dest.to_path_buf());
        blocking(move || copy_exclusive(&from, &to)).await.during("copyfile", dest)?;
        report.say(format!("file copied from {} to {}", src.display(), dest.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

fn copy_exclusive(src: &Path, dest: &Path) -> std::io::Result<u64> {
    let mut reader = std::fs::File::open(src)?;
    let mut writer = std::fs::OpenOptions::new().write(true).create_new(true).open(dest)?;
    std::io::copy(&mut reader, &mut writer)
}

/// Appends `data` to `path`, creating the file if needed.
///
/// Prints the content before and after. A failed "before" read is narrated
/// and does not stop the append.
pub async fn append_file(path: &Path, data: &str) -> ProbeReport {
    let mut report = ProbeReport::new("appendFile");
    let outcome = async {
        match fs::read(path).await.during("open", path) {
            Ok(existing) => {
                report.say(format!("file content before appending new data: {}", text(&existing)));
            }
            Err(e) => report.say(format!("Error: {e}")),
        }

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await
            .during("open", path)?;
        file.write_all(data.as_bytes()).await.during("write", path)?;
        file.flush().await.during("write", path)?;

        let updated = fs::read(path).await.during("open", path)?;
        report.say(format!("updated file content after appending new data: {}", text(&updated)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Writes `data` to `path`, creating or replacing it.
pub async fn write_file(path: &Path, data: &str) -> ProbeReport {
    let mut report = ProbeReport::new("writeFile");
    let outcome = async {
        fs::write(path, data).await.during("open", path)?;
        report.say(format!("'{data}' written to {}", path.display()));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Overwrites an existing file, printing its content before and after.
pub async fn write_file_overwrite(path: &Path, data: &str) -> ProbeReport {
    let mut report = ProbeReport::new("writeFile");
    let outcome = async {
        let before = fs::read(path).await.during("open", path)?;
        report.say(format!("content of {} before write: {}", path.display(), text(&before)));

        fs::write(path, data).await.during("open", path)?;
        report.say(format!("'{data}' written to {}", path.display()));

        let after = fs::read(path).await.during("open", path)?;
        report.say(format!("content of {} after write: {}", path.display(), text(&after)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Cuts `path` down to its first `length` bytes.
pub async fn truncate_file(path: &Path, length: u64) -> ProbeReport {
    let mut report = ProbeReport::new("truncate");
    let outcome = async {
        let before = fs::read(path).await.during("open", path)?;
        report.say(format!("content of {} before truncate: {}", path.display(), text(&before)));

        let file = fs::OpenOptions::new().write(true).open(path).await.during("open", path)?;
        file.set_len(length).await.during("ftruncate", path)?;
        report.say(format!(
            "everything after first {length} characters truncated from {}",
            path.display()
        ));

        let after = fs::read(path).await.during("open", path)?;
        report.say(format!("content of {} after truncate: {}", path.display(), text(&after)));
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

/// Watches `path` for `duration`, deleting it a third of the way through.
///
/// Each raised event is narrated; the watch always ends with an abort line.
pub async fn watch_file(path: &Path, duration: Duration) -> ProbeReport {
    let mut report = ProbeReport::new("watch");
    let outcome = async {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            let _ = tx.send(event);
        })
        .map_err(|e| notify_error(e, path))?;
        watcher.watch(path, RecursiveMode::NonRecursive).map_err(|e| notify_error(e, path))?;

        report.say("delete the watched file to trigger a watch event");
        let doomed = path.to_path_buf();
        let deleter = tokio::spawn(async move {
            tokio::time::sleep(duration / 3).await;
            fs::remove_file(&doomed).await
        });

        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                biased;
                () = &mut deadline => break,
                received = rx.recv() => match received {
                    Some(Ok(event)) => narrate_event(&mut report, &event, path),
                    Some(Err(e)) => return Err(notify_error(e, path)),
                    None => break,
                },
            }
        }
        report.say(format!("watch on {} aborted", path.display()));

        match deleter.await {
            Ok(removed) => removed.during("unlink", path)?,
            Err(join_err) => return Err(ProbeError::Io(join_err.to_string())),
        }
        Ok::<(), ProbeError>(())
    }
    .await;
    report.conclude(outcome)
}

fn narrate_event(report: &mut ProbeReport, event: &notify::Event, watched: &Path) {
    let event_type = match event.kind {
        EventKind::Create(_)
        | EventKind::Remove(_)
        | EventKind::Modify(ModifyKind::Name(_)) => "rename",
        EventKind::Modify(_) => "change",
        EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            debug!(kind = ?event.kind, "ignoring watch event");
            return;
        }
    };
    let filename = event.paths.first().map_or_else(|| file_name(watched), |p| file_name(p));
    report.say(format!("'{event_type}' watch event was raised for {filename}"));
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn notify_error(err: notify::Error, path: &Path) -> ProbeError {
    match err.kind {
        notify::ErrorKind::Io(io) => ProbeError::from_io(&io, "watch", path),
        notify::ErrorKind::PathNotFound => {
            ProbeError::NotFound(format!("no such file or directory, watch '{}'", path.display()))
        }
        other => ProbeError::Io(format!("{other:?}, watch '{}'", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SECRET: &str = "Here is some top secret data. ";

    fn seeded() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test1.txt");
        std::fs::write(&path, SECRET).unwrap();
        (temp, path)
    }

    #[tokio::test]
    async fn open_reports_descriptor_and_missing_file() {
        let (temp, path) = seeded();

        let opened = open_file(&path).await;
        assert!(opened.is_success());
        assert!(opened.lines()[0].starts_with(&format!("opened {}", path.display())));

        let dir = open_file(temp.path()).await;
        assert!(dir.is_success(), "{:?}", dir.failure());

        let missing = open_file(&temp.path().join("nonexistant.txt")).await;
        assert_eq!(missing.failure().map(ProbeError::kind), Some("not_found"));
    }

    #[tokio::test]
    async fn read_prints_content() {
        let (_temp, path) = seeded();
        let report = read_file(&path).await;
        assert_eq!(report.lines(), [format!("content of {}: {SECRET}", path.display())]);
    }

    #[tokio::test]
    async fn append_mode_handle_cannot_read() {
        let (_temp, path) = seeded();
        let report = read_file_in_append_mode(&path).await;
        assert!(!report.is_success());
        assert!(report.lines().is_empty());
    }

    #[tokio::test]
    async fn create_first_read_leaves_an_empty_file_and_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("createFirst.txt");

        let report = read_file_create_first(&path).await;

        assert_eq!(report.failure().map(ProbeError::kind), Some("io"));
        assert!(report.lines().is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[tokio::test]
    async fn base64_round_trips_to_original_text() {
        let (_temp, path) = seeded();
        let report = read_file_as_base64(&path).await;
        assert_eq!(
            report.lines()[0],
            format!("content of {}: SGVyZSBpcyBzb21lIHRvcCBzZWNyZXQgZGF0YS4g", path.display())
        );
        assert_eq!(
            report.lines()[1],
            format!("convert base64 file content back to an ASCII string: {SECRET}")
        );
    }

    #[tokio::test]
    async fn cancelled_read_is_reported_as_cancelled() {
        let (_temp, path) = seeded();
        let report = read_file_cancelled(&path).await;
        assert_eq!(report.failure(), Some(&ProbeError::Cancelled));
        assert_eq!(report.lines(), [format!("started reading file: {}", path.display())]);
    }

    #[tokio::test]
    async fn exclusive_copy_refuses_existing_destination() {
        let (temp, path) = seeded();
        let dest = temp.path().join("test1-copy.txt");
        std::fs::write(&dest, "original copy").unwrap();

        let report = copy_file_exclusive(&path, &dest).await;

        assert_eq!(report.failure().map(ProbeError::kind), Some("already_exists"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"original copy");
    }

    #[tokio::test]
    async fn copies_overwrite_then_exclusive_fails() {
        let (temp, path) = seeded();
        let dest = temp.path().join("test1-copy.txt");

        assert!(copy_file_exclusive(&path, &dest).await.is_success());
        assert!(copy_file(&path, &dest).await.is_success());
        assert!(!copy_file_exclusive(&path, &dest).await.is_success());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), SECRET);
    }

    #[tokio::test]
    async fn append_extends_existing_and_creates_missing() {
        let (temp, path) = seeded();

        let report = append_file(&path, " More important data.").await;
        assert!(report.is_success());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Here is some top secret data.  More important data."
        );

        let fresh = temp.path().join("appendNew.txt");
        let report = append_file(&fresh, "More important data.").await;
        assert!(report.is_success());
        assert!(report.lines()[0].starts_with("Error: "));
        assert_eq!(std::fs::read_to_string(&fresh).unwrap(), "More important data.");
    }

    #[tokio::test]
    async fn overwrite_leaves_no_residual_bytes() {
        let (_temp, path) = seeded();

        let report = write_file_overwrite(&path, "Rewritten.").await;

        assert!(report.is_success());
        assert_eq!(std::fs::read(&path).unwrap(), b"Rewritten.");
        assert_eq!(report.lines()[2], format!("content of {} after write: Rewritten.", path.display()));
    }

    #[tokio::test]
    async fn write_creates_new_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("writeNew.txt");
        let report = write_file(&path, "This data was written.").await;
        assert_eq!(report.lines(), [format!("'This data was written.' written to {}", path.display())]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "This data was written.");
    }

    #[tokio::test]
    async fn truncate_keeps_prefix() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test1.txt");
        let original = "Here is some top secret data.  More important data.";
        std::fs::write(&path, original).unwrap();

        let report = truncate_file(&path, 29).await;

        assert!(report.is_success());
        assert_eq!(std::fs::read(&path).unwrap(), &original.as_bytes()[..29]);
    }

    #[tokio::test]
    async fn watch_ends_with_abort_line_and_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("watchTest.txt");
        std::fs::write(&path, "Test watching files").unwrap();

        let report = watch_file(&path, Duration::from_millis(600)).await;

        assert!(report.is_success(), "{:?}", report.failure());
        assert_eq!(report.lines().last().unwrap(), &format!("watch on {} aborted", path.display()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn watch_on_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let report = watch_file(&temp.path().join("gone.txt"), Duration::from_millis(50)).await;
        assert!(!report.is_success());
    }
}
