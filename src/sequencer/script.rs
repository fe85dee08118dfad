//! The linear demo script: nested sections of steps with declared preconditions.

use std::io;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::probe::{resolve, Probe};

/// A fact about the fixture tree a step relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Precondition {
    /// The entry must exist (links are not followed).
    Exists(String),
    /// The entry must not exist.
    Absent(String),
}

impl Precondition {
    /// Shorthand for [`Precondition::Exists`].
    #[must_use]
    pub fn exists(path: &str) -> Self {
        Self::Exists(path.to_string())
    }

    /// Shorthand for [`Precondition::Absent`].
    #[must_use]
    pub fn absent(path: &str) -> Self {
        Self::Absent(path.to_string())
    }

    /// Checks the precondition under `root`, describing why it failed.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the precondition does not hold.
    pub fn check(&self, root: &Path) -> Result<(), String> {
        match self {
            Self::Exists(rel) => match std::fs::symlink_metadata(resolve(root, rel)) {
                Ok(_) => Ok(()),
                Err(e) => Err(format!("{rel} must exist ({e})")),
            },
            Self::Absent(rel) => match std::fs::symlink_metadata(resolve(root, rel)) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Ok(_) => Err(format!("{rel} must not exist yet")),
                Err(e) => Err(format!("{rel} must not exist yet ({e})")),
            },
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exists(rel) => write!(f, "+{rel}"),
            Self::Absent(rel) => write!(f, "-{rel}"),
        }
    }
}

/// One narrated probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Section titles from outermost to innermost.
    pub section: Vec<String>,
    /// Position within the innermost section, starting at 1.
    pub number: usize,
    /// Human-readable description.
    pub title: String,
    /// The probe to run.
    pub probe: Probe,
    /// Facts that must hold before running.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<Precondition>,
}

impl Step {
    /// Adds preconditions to this step.
    pub fn requires(&mut self, preconditions: impl IntoIterator<Item = Precondition>) -> &mut Self {
        self.preconditions.extend(preconditions);
        self
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

/// Incrementally builds a [`Script`] with nested sections.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    sections: Vec<String>,
    counters: Vec<usize>,
    steps: Vec<Step>,
}

impl ScriptBuilder {
    /// Starts an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `body` with `title` pushed as the innermost section.
    pub fn section(&mut self, title: &str, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.sections.push(title.to_string());
        self.counters.push(0);
        body(self);
        self.counters.pop();
        self.sections.pop();
        self
    }

    /// Appends a step to the innermost section.
    pub fn step(&mut self, title: &str, probe: Probe) -> &mut Step {
        let number = match self.counters.last_mut() {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => self.steps.len() + 1,
        };
        self.steps.push(Step {
            section: self.sections.clone(),
            number,
            title: title.to_string(),
            probe,
            preconditions: Vec::new(),
        });
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Finishes the script.
    #[must_use]
    pub fn build(self) -> Script {
        Script { steps: self.steps }
    }
}

fn new_year_2020() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default()
}

fn p(path: &str) -> String {
    path.to_string()
}

impl Script {
    /// The steps in run order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Keeps only top-level sections whose title contains `needle`
    /// (case-insensitive).
    #[must_use]
    pub fn only_sections(self, needle: &str) -> Self {
        let needle = needle.to_lowercase();
        let steps = self
            .steps
            .into_iter()
            .filter(|step| step.section.first().is_some_and(|s| s.to_lowercase().contains(&needle)))
            .collect();
        Self { steps }
    }

    /// The fixed narrative run by `fsprobe run`.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn standard() -> Self {
        use Precondition as Pre;
        let mut b = ScriptBuilder::new();

        b.section("Comparing FS module APIs", |b| {
            b.step(
                "Read a file with the future API:",
                Probe::ReadWithFuture { path: p("test1.txt") },
            )
            .requires([Pre::exists("test1.txt")]);
            b.step(
                "Read a file with the callback API:",
                Probe::ReadWithCallback { path: p("test1.txt") },
            )
            .requires([Pre::exists("test1.txt")]);
            b.step("Read a file with the sync API:", Probe::ReadSync { path: p("test1.txt") })
                .requires([Pre::exists("test1.txt")]);
        });

        b.section("Working with files", |b| {
            b.section("open()", |b| {
                b.step("Open a file:", Probe::Open { path: p("test1.txt") })
                    .requires([Pre::exists("test1.txt")]);
                b.step("Open a directory:", Probe::Open { path: p("") });
                b.step(
                    "Fail to open a file that does not exist:",
                    Probe::Open { path: p("nonexistant.txt") },
                )
                .requires([Pre::absent("nonexistant.txt")]);
            });

            b.section("readFile()", |b| {
                b.step("Read a file:", Probe::Read { path: p("test1.txt") });
                b.step(
                    "Fail to read a file opened in append mode:",
                    Probe::ReadInAppendMode { path: p("test1.txt") },
                );
                b.step(
                    "Fail to read a file opened for writing, which creates it first:",
                    Probe::ReadCreateFirst { path: p("createFirst.txt") },
                )
                .requires([Pre::absent("createFirst.txt")]);
                b.step(
                    "Read a file as base64 encoding:",
                    Probe::ReadAsBase64 { path: p("test1.txt") },
                );
                b.step(
                    "Start to read a file but abort the operation early:",
                    Probe::ReadCancelled { path: p("test1.txt") },
                );
            });

            b.section("copyFile()", |b| {
                b.step(
                    "Create a copy of a file:",
                    Probe::Copy { src: p("test1.txt"), dest: p("test1-copy.txt") },
                )
                .requires([Pre::exists("test1.txt"), Pre::absent("test1-copy.txt")]);
                b.step(
                    "Create a second copy and overwrite the destination:",
                    Probe::Copy { src: p("test1.txt"), dest: p("test1-copy.txt") },
                )
                .requires([Pre::exists("test1-copy.txt")]);
                b.step(
                    "Fail to create a third copy because the destination already exists:",
                    Probe::CopyExclusive { src: p("test1.txt"), dest: p("test1-copy.txt") },
                )
                .requires([Pre::exists("test1-copy.txt")]);
            });

            b.section("appendFile()", |b| {
                b.step(
                    "Append data to an existing file:",
                    Probe::Append { path: p("test1.txt"), data: p(" More important data.") },
                )
                .requires([Pre::exists("test1.txt")]);
                b.step(
                    "Append data to a file that doesn't exist yet:",
                    Probe::Append { path: p("appendNew.txt"), data: p("More important data.") },
                )
                .requires([Pre::absent("appendNew.txt")]);
            });

            b.section("writeFile()", |b| {
                b.step(
                    "Write data to a new file:",
                    Probe::Write { path: p("writeNew.txt"), data: p("This data was written.") },
                )
                .requires([Pre::absent("writeNew.txt")]);
                b.step(
                    "Write data to an existing file:",
                    Probe::WriteOverwrite { path: p("writeNew.txt"), data: p("Rewritten.") },
                )
                .requires([Pre::exists("writeNew.txt")]);
            });

            b.section("truncate()", |b| {
                b.step(
                    "Truncate data in an existing file:",
                    Probe::Truncate { path: p("test1.txt"), length: 29 },
                )
                .requires([Pre::exists("test1.txt")]);
            });

            b.section("watch()", |b| {
                b.step(
                    "Watch a file for changes while it is deleted:",
                    Probe::Watch { path: p("watchTest.txt") },
                )
                .requires([Pre::exists("watchTest.txt")]);
            });
        });

        b.section("Working with file metadata", |b| {
            b.section("stat()", |b| {
                b.step("Read size of a file:", Probe::FileSize { path: p("test1.txt") });
                b.step(
                    "Read size of a directory entry (not the size of its contents):",
                    Probe::FileSize { path: p("") },
                );
                b.step("View all stats of a file:", Probe::AllStats { path: p("test1.txt") });
            });

            b.section("access()", |b| {
                b.step("Check if a file is visible:", Probe::Access { path: p("test1.txt") });
                b.step(
                    "Fail to check access to a file that doesn't exist:",
                    Probe::Access { path: p("nonexistent.txt") },
                )
                .requires([Pre::absent("nonexistent.txt")]);
                b.step(
                    "Fail with no execute access on a file:",
                    Probe::ExecuteAccess { path: p("chmod.txt") },
                )
                .requires([Pre::exists("chmod.txt")]);
            });

            b.section("chmod()", |b| {
                b.step(
                    "Remove write access on a file:",
                    Probe::Chmod { path: p("chmod.txt"), mode: 0o500 },
                )
                .requires([Pre::exists("chmod.txt")]);
            });

            b.section("chown()", |b| {
                b.step(
                    "Change user and group owners of a file to root:",
                    Probe::Chown { path: p("chmod.txt"), uid: 0, gid: 0 },
                );
                b.step(
                    "Change ownership of a file to a non-existent user and group:",
                    Probe::Chown { path: p("chmod.txt"), uid: 12345, gid: 12345 },
                );
            });

            b.section("utimes()", |b| {
                b.step(
                    "Set access and modified timestamps on a file:",
                    Probe::Utimes {
                        path: p("test1.txt"),
                        atime: new_year_2020(),
                        mtime: new_year_2020(),
                    },
                )
                .requires([Pre::exists("test1.txt")]);
            });

            b.section("realpath()", |b| {
                b.step("Get the real path of a relative path:", Probe::RealPath { path: p("") });
                b.step(
                    "Get the real path of a symbolic link:",
                    Probe::RealPath { path: p("test1-sym-link") },
                )
                .requires([Pre::exists("test1-sym-link")]);
            });
        });

        b.section("Working with links", |b| {
            b.step(
                "Create a hard link:",
                Probe::HardLink { existing: p("test1.txt"), new_path: p("test1-hard-link") },
            )
            .requires([Pre::exists("test1.txt"), Pre::absent("test1-hard-link")]);
            b.step(
                "Create a soft (symbolic) link:",
                Probe::SoftLink { target: p("test1.txt"), path: p("test1-soft-link") },
            )
            .requires([Pre::absent("test1-soft-link")]);
            b.step("Read where a soft link points:", Probe::ReadLink { path: p("test1-soft-link") })
                .requires([Pre::exists("test1-soft-link")]);
            b.step(
                "Set timestamps on the link entry rather than its target:",
                Probe::LinkUtimes {
                    path: p("test1-soft-link"),
                    atime: new_year_2020(),
                    mtime: new_year_2020(),
                },
            )
            .requires([Pre::exists("test1-soft-link")]);
            b.step(
                "Change ownership of the link entry to root:",
                Probe::LinkChown { path: p("test1-soft-link"), uid: 0, gid: 0 },
            )
            .requires([Pre::exists("test1-soft-link")]);
            b.step(
                "Fail to change the mode of the link entry itself:",
                Probe::LinkChmod { path: p("test1-soft-link"), mode: 0o500 },
            )
            .requires([Pre::exists("test1-soft-link")]);
            b.step("Remove a soft link:", Probe::Unlink { path: p("test1-soft-link") })
                .requires([Pre::exists("test1-soft-link")]);
        });

        b.section("Working with directories", |b| {
            b.step(
                "Create nested directories:",
                Probe::Mkdir { path: p("scratch/nested/deeper") },
            )
            .requires([Pre::absent("scratch")]);
            b.step("Create a uniquely named directory:", Probe::Mkdtemp { prefix: p("tmp-") });
            b.step("Read the entries of a directory:", Probe::ReadDir { path: p("") });
            b.step("Walk a directory through an open handle:", Probe::OpenDir { path: p("docs") })
                .requires([Pre::exists("docs")]);
            b.step(
                "Rename a directory:",
                Probe::Rename { from: p("scratch"), to: p("renamed-scratch") },
            )
            .requires([Pre::exists("scratch"), Pre::absent("renamed-scratch")]);
            b.step(
                "Remove an empty directory:",
                Probe::Rmdir { path: p("renamed-scratch/nested/deeper") },
            )
            .requires([Pre::exists("renamed-scratch/nested/deeper")]);
            b.step(
                "Fail to remove a directory that is not empty:",
                Probe::Rmdir { path: p("docs") },
            )
            .requires([Pre::exists("docs")]);
            b.step("Remove a directory and everything in it:", Probe::Rm { path: p("docs") })
                .requires([Pre::exists("docs")]);
        });

        b.build()
    }
}
