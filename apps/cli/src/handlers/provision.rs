use anyhow::{Context, Result};
use fpm::layout::StateFile;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Resolves `descriptor` against the repository and writes the installation's state file.
///
/// # Errors
/// Returns an error if the inputs cannot be loaded, resolution fails or the state file
/// cannot be written.
pub fn run(
    descriptor: &Path,
    repository: &Path,
    install_dir: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let state = fpm::provision_from_files(repository, descriptor)
        .with_context(|| format!("Failed to provision {}", descriptor.display()))?;

    let file = StateFile::for_installation(install_dir);
    file.write(&state).context("Failed to persist the provisioned state")?;
    info!(path = %file.path().display(), "Provisioned state written");

    writeln!(
        out,
        "Provisioned {} feature-pack(s) and {} config(s)",
        state.feature_packs().len(),
        state.configs().len()
    )?;
    writeln!(out, "State written to {}", file.path().display())?;
    Ok(())
}
