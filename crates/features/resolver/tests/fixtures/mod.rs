#![allow(dead_code)]

use fpm_domain::spec::{FeatureParameterSpec, FeatureSpec};
use fpm_domain::{FeaturePackConfig, Gav, ProvisionedConfig, ProvisionedState, ProvisioningConfig};
use fpm_resolver::{InMemoryRepository, Provisioner, ProvisioningError};

pub const GROUP: &str = "org.jboss.pm.test";
pub const VERSION: &str = "1.0.0.Final";

#[must_use]
pub fn gav(artifact: &str) -> Gav {
    Gav::new(GROUP, artifact, VERSION).expect("valid gav")
}

/// A spec with a single id parameter and optional nillable extras.
#[must_use]
pub fn spec(name: &str, id: &str, nillable: &[&str]) -> FeatureSpec {
    nillable
        .iter()
        .fold(FeatureSpec::builder(name).param(FeatureParameterSpec::id(id)), |builder, param| {
            builder.param(FeatureParameterSpec::nillable(*param))
        })
        .build()
        .expect("valid feature spec")
}

/// A request installing each artifact with its default configuration.
#[must_use]
pub fn request(artifacts: &[&str]) -> ProvisioningConfig {
    artifacts
        .iter()
        .fold(ProvisioningConfig::builder(), |builder, artifact| {
            builder.feature_pack(FeaturePackConfig::for_gav(gav(artifact)))
        })
        .build()
        .expect("valid request")
}

/// # Errors
/// Whatever the provisioner reports.
pub fn provision(
    repository: &InMemoryRepository,
    request: &ProvisioningConfig,
) -> Result<ProvisionedState, ProvisioningError> {
    Provisioner::new(repository).provision(request)
}

/// Unqualified feature ids of a config, in resolution order.
#[must_use]
pub fn feature_ids(config: &ProvisionedConfig) -> Vec<String> {
    config.features().iter().map(|f| f.id().to_feature_id().to_string()).collect()
}

/// # Panics
/// When the state has no config with that name.
#[must_use]
pub fn named_config<'s>(state: &'s ProvisionedState, name: &str) -> &'s ProvisionedConfig {
    state
        .configs()
        .iter()
        .find(|config| config.name() == Some(name))
        .unwrap_or_else(|| panic!("config {name} is not provisioned"))
}
