//! # Provisioning Resolver
//!
//! Turns a [`ProvisioningConfig`](fpm_domain::ProvisioningConfig) and a
//! [`FeaturePackRepository`] into a [`ProvisionedState`](fpm_domain::ProvisionedState):
//!
//! 1. lay out the requested feature-packs and their dependencies,
//! 2. select packages,
//! 3. pick and merge configs through the customization chain of each feature-pack,
//! 4. expand config bodies and feature groups under their filters,
//! 5. resolve references and capabilities and order the features of each config.
//!
//! ```no_run
//! use fpm_resolver::{InMemoryRepository, Provisioner};
//! # fn run(request: &fpm_domain::ProvisioningConfig) -> Result<(), fpm_resolver::ProvisioningError> {
//! let repository = InMemoryRepository::new();
//! let state = Provisioner::new(&repository).provision(request)?;
//! # Ok(())
//! # }
//! ```

mod accumulator;
pub mod capability;
mod configs;
pub mod error;
mod expand;
pub mod handler;
mod layout;
mod packages;
pub mod provisioner;
mod references;
pub mod repository;

pub use capability::{CapabilityIndex, expand_capability};
pub use error::{ErrorCategory, ProvisioningError, ProvisioningErrorExt};
pub use handler::{ProvisionedConfigHandler, walk_config, walk_state};
pub use provisioner::{NoRepository, Provisioner, ProvisionerBuilder, WithRepository};
pub use repository::{FeaturePackRepository, InMemoryRepository};
