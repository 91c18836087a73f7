//! # Feature-pack Domain Models
//!
//! Pure data types describing feature-packs and what an installation asks of them:
//! identities, specs shipped inside feature-packs, installation customizations and the
//! provisioned state produced by resolution. Keep it lean: no I/O and no resolution
//! logic, only data, validation and simple helpers.

pub mod capability;
pub mod customize;
pub mod error;
pub mod gav;
pub mod ids;
pub mod param;
pub mod spec;
pub mod state;

pub use capability::{CapabilitySegment, CapabilitySpec};
pub use customize::{
    ConfigCustomizations, ConfigDecision, FeaturePackConfig, IncludedConfig, ProvisioningConfig,
};
pub use error::{DescriptionError, DescriptionErrorExt};
pub use gav::{Gav, LATEST};
pub use ids::{ConfigId, FeatureId, IdParams, ResolvedFeatureId, ResolvedSpecId};
pub use state::{ProvisionedConfig, ProvisionedFeature, ProvisionedFeaturePack, ProvisionedState};
