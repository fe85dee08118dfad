//! End-to-end checks of what the demo leaves behind in the scratch tree.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run_section(data: &Path, section: &str) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_fsprobe"))
        .args(["run", "--watch-ms", "300", "--section", section, "--data-dir"])
        .arg(data)
        .env_remove("FSPROBE_REPORT")
        .output()
        .expect("failed to run fsprobe binary");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn file_section_appends_then_truncates() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    let stdout = run_section(&data, "working with files");

    assert!(stdout.contains(
        "updated file content after appending new data: Here is some top secret data.  More important data."
    ));
    assert_eq!(
        std::fs::read_to_string(data.join("test1.txt")).unwrap(),
        "Here is some top secret data."
    );
    assert_eq!(std::fs::read_to_string(data.join("test1-copy.txt")).unwrap().len(), 30);
    assert_eq!(
        std::fs::read_to_string(data.join("appendNew.txt")).unwrap(),
        "More important data."
    );
    assert_eq!(std::fs::read_to_string(data.join("writeNew.txt")).unwrap(), "Rewritten.");
    assert!(!data.join("watchTest.txt").exists());
    assert_eq!(std::fs::read(data.join("createFirst.txt")).unwrap(), b"");
}

#[test]
fn exclusive_copy_leaves_destination_untouched() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    let stdout = run_section(&data, "working with files");

    let exclusive = stdout
        .lines()
        .skip_while(|line| !line.contains("Fail to create a third copy"))
        .nth(1)
        .expect("exclusive copy step is narrated");
    assert!(exclusive.trim_start().starts_with("Error: "), "{exclusive}");
    assert_eq!(
        std::fs::read(data.join("test1-copy.txt")).unwrap(),
        b"Here is some top secret data. "
    );
}

#[test]
fn parity_reads_agree() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    let stdout = run_section(&data, "comparing");

    let expected =
        format!("content of {}: Here is some top secret data. ", data.join("test1.txt").display());
    assert_eq!(stdout.lines().filter(|l| l.trim() == expected.trim_end()).count(), 3);
}

#[test]
fn directory_section_removes_docs_and_keeps_renamed_tree() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    let stdout = run_section(&data, "directories");

    assert!(!data.join("docs").exists());
    assert!(data.join("renamed-scratch/nested").is_dir());
    assert!(!data.join("renamed-scratch/nested/deeper").exists());
    assert!(stdout.contains("[dir] docs"));
    let temp_dirs = std::fs::read_dir(&data)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with("tmp-"))
        .count();
    assert_eq!(temp_dirs, 1);
}

#[test]
fn rerun_starts_from_a_fresh_tree() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    run_section(&data, "directories");
    let stdout = run_section(&data, "directories");

    assert!(!stdout.contains("skipped:"), "{stdout}");
}
