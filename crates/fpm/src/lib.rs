//! Facade crate for the feature-pack provisioning engine.
//! Re-exports the domain model, the resolver and (with the `layout` feature) the file-backed
//! layout. Keep this crate thin: it should compose other crates, not implement resolution.
//!
//! ## Usage
//! - Build requests with [`domain`] types or load them with [`layout`].
//! - Resolve with [`resolver::Provisioner`], or call [`provision_from_files`] for the common
//!   "directory repository + TOML descriptor" case.

use std::borrow::Cow;

pub use fpm_domain as domain;
#[cfg(feature = "layout")]
pub use fpm_layout as layout;
pub use fpm_resolver as resolver;

/// Items most callers need.
pub mod prelude {
    pub use fpm_domain::{
        ConfigId, FeaturePackConfig, Gav, ProvisionedConfig, ProvisionedState, ProvisioningConfig,
    };
    pub use fpm_resolver::{
        FeaturePackRepository, InMemoryRepository, ProvisionedConfigHandler, Provisioner,
        ProvisioningError, walk_config, walk_state,
    };
}

/// Build-time enabled features (by Cargo feature).
pub mod features {
    pub const ENABLED: &[&str] = &[
        "resolver",
        #[cfg(feature = "layout")]
        "layout",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Errors of the facade's one-call helpers.
#[fpm_derive::fpm_error]
pub enum Error {
    #[cfg(feature = "layout")]
    #[error("Layout failure{}: {source}", format_context(.context))]
    Layout { source: fpm_layout::LayoutError, context: Option<Cow<'static, str>> },

    #[error("Provisioning failure{}: {source}", format_context(.context))]
    Provisioning { source: fpm_resolver::ProvisioningError, context: Option<Cow<'static, str>> },
}

/// Loads a repository directory and a descriptor file, then resolves the descriptor.
///
/// # Errors
/// Returns [`Error::Layout`] when either input cannot be loaded and [`Error::Provisioning`]
/// when resolution fails.
#[cfg(feature = "layout")]
pub fn provision_from_files(
    repository: impl AsRef<std::path::Path>,
    descriptor: impl AsRef<std::path::Path>,
) -> Result<domain::ProvisionedState> {
    let repository = layout::load_repository(repository)?;
    let descriptor = layout::load_descriptor(descriptor)?;
    Ok(resolver::Provisioner::new(&repository).provision(&descriptor)?)
}
