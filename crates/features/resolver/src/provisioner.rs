//! Entry point of a provisioning run.

use crate::configs::{ConfigAssembly, assemble_configs};
use crate::error::ProvisioningError;
use crate::expand::ConfigExpander;
use crate::layout::Layout;
use crate::packages::resolve_packages;
use crate::references::resolve_features;
use crate::repository::FeaturePackRepository;
use fpm_domain::state::ProvisionedConfigBuilder;
use fpm_domain::{ProvisionedConfig, ProvisionedFeaturePack, ProvisionedState, ProvisioningConfig};
use private::Sealed;
use std::fmt;
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
pub struct NoRepository;

pub struct WithRepository<'r, R: ?Sized>(&'r R);

impl<R: ?Sized> fmt::Debug for WithRepository<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithRepository").finish_non_exhaustive()
    }
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRepository {}
impl<R: ?Sized> Sealed for WithRepository<'_, R> {}

/// Builder for a [`Provisioner`]; a repository must be set before `build` is available.
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct ProvisionerBuilder<S: Sealed = NoRepository> {
    state: S,
}

impl ProvisionerBuilder {
    #[must_use = "Builder must be given a repository before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository feature-packs are looked up in.
    #[must_use = "The builder must be built to produce a provisioner."]
    pub const fn repository<R>(self, repository: &R) -> ProvisionerBuilder<WithRepository<'_, R>>
    where
        R: FeaturePackRepository + ?Sized,
    {
        let Self { state: NoRepository } = self;
        ProvisionerBuilder { state: WithRepository(repository) }
    }
}

impl<'r, R: FeaturePackRepository + ?Sized> ProvisionerBuilder<WithRepository<'r, R>> {
    #[must_use]
    pub const fn build(self) -> Provisioner<'r, R> {
        Provisioner { repository: self.state.0 }
    }
}

/// Resolves provisioning requests against a repository.
///
/// A run is synchronous and stops at the first error. The same request always yields the same
/// [`ProvisionedState`].
pub struct Provisioner<'r, R: ?Sized> {
    repository: &'r R,
}

impl<R: ?Sized> fmt::Debug for Provisioner<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner").finish_non_exhaustive()
    }
}

impl<'r, R: FeaturePackRepository + ?Sized> Provisioner<'r, R> {
    /// Shorthand for `ProvisionerBuilder::new().repository(repository).build()`.
    pub const fn new(repository: &'r R) -> Self {
        Self { repository }
    }
}

impl<R: FeaturePackRepository + ?Sized> Provisioner<'_, R> {
    /// Lays out the requested feature-packs, selects their packages and builds every config.
    ///
    /// # Errors
    /// Layout errors are returned as is; errors raised while building a config are wrapped in
    /// [`ProvisioningError::ConfigBuild`].
    #[instrument(skip_all, fields(feature_packs = request.feature_packs().count()))]
    pub fn provision(&self, request: &ProvisioningConfig) -> Result<ProvisionedState, ProvisioningError> {
        let layout = Layout::build(self.repository, request)?;
        let packages = resolve_packages(&layout)?;

        let mut state = ProvisionedState::builder();
        for (index, entry) in layout.entries().iter().enumerate() {
            if !entry.top_level && packages[index].is_empty() {
                continue;
            }
            let feature_pack = packages[index]
                .iter()
                .fold(ProvisionedFeaturePack::builder(entry.gav().clone()), |builder, package| {
                    builder.package(package.as_str())
                })
                .build();
            debug!(gav = %entry.gav(), packages = packages[index].len(), "Feature-pack provisioned");
            state = state.feature_pack(feature_pack);
        }

        for assembly in assemble_configs(&layout) {
            let label = assembly.id.to_string();
            let config = build_config(&layout, assembly).map_err(|e| e.in_config(label))?;
            state = state.config(config);
        }

        let state = state.build()?;
        info!(
            feature_packs = state.feature_packs().len(),
            configs = state.configs().len(),
            "Provisioning resolved"
        );
        Ok(state)
    }
}

fn build_config(
    layout: &Layout<'_>,
    assembly: ConfigAssembly<'_>,
) -> Result<ProvisionedConfig, ProvisioningError> {
    let mut expander = ConfigExpander::new(layout);
    for part in &assembly.parts {
        expander.expand_config(part.spec, part.scope, part.filter)?;
    }
    let accumulator = expander.finish();
    debug!(config = %assembly.id, features = accumulator.len(), "Config expanded");

    let features = resolve_features(layout, accumulator.into_entries())?;
    let config = assembly
        .props
        .into_iter()
        .fold(ProvisionedConfig::builder(assembly.id), |builder, (name, value)| {
            builder.property(name, value)
        });
    Ok(features.into_iter().fold(config, ProvisionedConfigBuilder::feature).build()?)
}
