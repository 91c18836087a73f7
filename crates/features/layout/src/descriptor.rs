//! Provisioning descriptors: the TOML form of a [`ProvisioningConfig`].
//!
//! ```toml
//! [[feature-packs]]
//! gav = "org.example:fp1:1.0"
//! origin = "fp1"
//! exclude-packages = ["docs"]
//!
//! [feature-packs.configs]
//! exclude-models = [{ model = "host", named-only = true }]
//!
//! [configs]
//! define = [{ model = "host", name = "extra", items = [{ spec = "specA", origin = "fp1", params = { name = "x" } }] }]
//! ```

use crate::document::DescriptorDocument;
use crate::error::{LayoutError, LayoutErrorExt, Result};
use crate::repository::read_document;
use fpm_domain::ProvisioningConfig;
use std::path::Path;
use tracing::debug;

/// Reads a provisioning descriptor file.
///
/// # Errors
/// Returns [`LayoutError::FileNotFound`] when `path` is not a file, and any read, parse or
/// description error with the path in its context.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<ProvisioningConfig> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LayoutError::FileNotFound {
            message: path.display().to_string().into(),
            context: Some("provisioning descriptor".into()),
        });
    }
    let document: DescriptorDocument = read_document(path)?;
    let config = document.into_config().context(path.display().to_string())?;
    debug!(path = %path.display(), feature_packs = config.feature_packs().count(), "Descriptor loaded");
    Ok(config)
}

/// Parses a provisioning descriptor.
///
/// # Errors
/// Returns [`LayoutError::Toml`] for malformed documents and [`LayoutError::Description`]
/// for invalid customizations.
pub fn parse_descriptor(text: &str) -> Result<ProvisioningConfig> {
    let document: DescriptorDocument = toml::from_str(text)?;
    Ok(document.into_config()?)
}
