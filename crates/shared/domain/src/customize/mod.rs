//! Installation-side customizations layered over feature-pack definitions.

mod customizations;
mod feature_pack_config;
mod provisioning;

pub use customizations::{
    ConfigCustomizations, ConfigCustomizationsBuilder, ConfigDecision, IncludedConfig,
};
pub use feature_pack_config::{FeaturePackConfig, FeaturePackConfigBuilder};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigBuilder};
