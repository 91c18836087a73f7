use anyhow::{Context, Result};
use fpm::prelude::{ProvisionedConfig, ProvisionedConfigHandler, ProvisioningError, walk_state};
use fpm::domain::{Gav, ProvisionedFeature, ResolvedSpecId};
use std::io::Write;
use std::path::Path;

/// Resolves `descriptor` and prints every config, grouped by feature-pack and spec.
///
/// # Errors
/// Returns an error if the inputs cannot be loaded, resolution fails or the output cannot
/// be written.
pub fn run(descriptor: &Path, repository: &Path, out: &mut impl Write) -> Result<()> {
    let state = fpm::provision_from_files(repository, descriptor)
        .with_context(|| format!("Failed to resolve {}", descriptor.display()))?;

    for feature_pack in state.feature_packs() {
        let packages: Vec<&str> = feature_pack.packages().collect();
        writeln!(out, "feature-pack {} [{}]", feature_pack.gav(), packages.join(", "))?;
    }
    walk_state(&state, &mut PrintingHandler::new(out))?;
    Ok(())
}

/// Prints a config as an indented tree: config, feature-pack, spec, feature parameters.
#[derive(Debug)]
pub struct PrintingHandler<W> {
    out: W,
}

impl<W: Write> PrintingHandler<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) -> Result<(), ProvisioningError> {
        writeln!(self.out, "{line}").map_err(|e| format!("Failed to write output: {e}").into())
    }
}

impl<W: Write> ProvisionedConfigHandler for PrintingHandler<W> {
    fn prepare(&mut self, config: &ProvisionedConfig) -> Result<(), ProvisioningError> {
        self.line(format_args!("config {}", config.id()))?;
        for (name, value) in config.properties() {
            self.line(format_args!("  {name} = {value}"))?;
        }
        Ok(())
    }

    fn next_feature_pack(&mut self, gav: &Gav) -> Result<(), ProvisioningError> {
        self.line(format_args!("  {gav}"))
    }

    fn next_spec(&mut self, spec: &ResolvedSpecId) -> Result<(), ProvisioningError> {
        self.line(format_args!("    {}", spec.name()))
    }

    fn next_feature(&mut self, feature: &ProvisionedFeature) -> Result<(), ProvisioningError> {
        let params: Vec<String> =
            feature.params().iter().map(|(name, value)| format!("{name}={value}")).collect();
        self.line(format_args!("      {}", params.join(", ")))
    }
}
