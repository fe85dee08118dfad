//! `fsprobe steps` command.

use crate::sequencer::Script;

/// Execute the `steps` command.
///
/// Displays a table of the demo script showing section, step title, probe
/// and preconditions without touching the filesystem.
///
/// # Errors
///
/// Returns an error string if no section matches the filter.
pub fn run(section: Option<&str>) -> Result<(), String> {
    let script = match section {
        Some(needle) => Script::standard().only_sections(needle),
        None => Script::standard(),
    };
    if script.steps().is_empty() {
        return Err(format!("No section matches {:?}.", section.unwrap_or_default()));
    }

    let rows = rows(&script);

    // Calculate column widths.
    let section_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(7).max(7);
    let title_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(4).max(4);
    let probe_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(5).max(5);

    println!(
        "{:<section_width$}  {:<title_width$}  {:<probe_width$}  REQUIRES",
        "SECTION", "STEP", "PROBE",
    );
    println!("{:-<section_width$}  {:-<title_width$}  {:-<probe_width$}  --------", "", "", "");

    for (section, title, probe, requires) in &rows {
        println!(
            "{section:<section_width$}  {title:<title_width$}  {probe:<probe_width$}  {requires}"
        );
    }

    println!("\n{} step(s) total.", rows.len());
    Ok(())
}

fn rows(script: &Script) -> Vec<(String, String, String, String)> {
    script
        .steps()
        .iter()
        .map(|step| {
            let requires =
                step.preconditions.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
            (
                step.section.join(" / "),
                format!("{}) {}", step.number, step.title),
                step.probe.primitive().to_string(),
                requires,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_show_nested_sections_and_preconditions() {
        let rows = rows(&Script::standard());
        let copy = rows
            .iter()
            .find(|r| r.1 == "1) Create a copy of a file:")
            .expect("copy step is listed");

        assert_eq!(copy.0, "Working with files / copyFile()");
        assert_eq!(copy.2, "copyFile");
        assert_eq!(copy.3, "+test1.txt -test1-copy.txt");
    }

    #[test]
    fn unknown_section_is_an_error() {
        assert!(run(Some("no such section")).is_err());
    }

    #[test]
    fn known_section_lists() {
        assert!(run(Some("directories")).is_ok());
    }
}
