//! `fsprobe reset` command.

use crate::config::{DemoConfig, Overrides};
use crate::fixture;

/// Execute the `reset` command.
///
/// Wipes and reseeds the scratch tree, optionally checking every seeded file.
///
/// # Errors
///
/// Returns an error string if configuration, the reset or the check fails.
pub fn run(overrides: &Overrides, verify: bool) -> Result<(), String> {
    let config = DemoConfig::resolve(overrides)?;
    let tree = fixture::reset(&config.data_dir).map_err(|e| e.to_string())?;

    println!("Reset fixture tree at {}", tree.root.display());
    if !tree.symlink_created {
        println!("Symbolic link {} was not created on this host.", fixture::SYMLINK_NAME);
    }

    if verify {
        fixture::verify(&tree.root).map_err(|e| e.to_string())?;
        println!("Verified {} seeded file(s).", fixture::MANIFEST.len());
    }
    Ok(())
}
