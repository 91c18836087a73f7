use anyhow::{Context, Result};
use fpm::layout::StateFile;
use std::io::Write;
use std::path::Path;

/// Prints the feature-packs, packages and configs recorded in a state file.
///
/// # Errors
/// Returns an error if the file cannot be read or the output cannot be written.
pub fn run(file: &Path, out: &mut impl Write) -> Result<()> {
    let state = StateFile::at(file)
        .read()
        .with_context(|| format!("Failed to read state file {}", file.display()))?;

    for feature_pack in state.feature_packs() {
        let packages: Vec<&str> = feature_pack.packages().collect();
        writeln!(out, "feature-pack {} [{}]", feature_pack.gav(), packages.join(", "))?;
    }
    for config in state.configs() {
        writeln!(out, "config {}: {} feature(s)", config.id(), config.features().len())?;
    }
    Ok(())
}
