//! # Feature-pack Layout
//!
//! File-backed surface of the provisioning engine:
//!
//! - [`load_repository`] walks a directory for `feature-pack.toml` documents and fills an
//!   [`fpm_resolver::InMemoryRepository`];
//! - [`load_descriptor`] reads a provisioning descriptor into a
//!   [`fpm_domain::ProvisioningConfig`];
//! - [`StateFile`] persists the resolved [`fpm_domain::ProvisionedState`] as JSON.
//!
//! ```no_run
//! use fpm_layout::{StateFile, load_descriptor, load_repository};
//! use fpm_resolver::Provisioner;
//!
//! # fn main() -> anyhow::Result<()> {
//! let repository = load_repository("repo")?;
//! let descriptor = load_descriptor("provisioning.toml")?;
//! let state = Provisioner::new(&repository).provision(&descriptor)?;
//! StateFile::for_installation("server").write(&state)?;
//! # Ok(())
//! # }
//! ```

mod descriptor;
mod document;
pub mod error;
mod repository;
mod state;

pub use descriptor::{load_descriptor, parse_descriptor};
pub use error::{LayoutError, LayoutErrorExt};
pub use repository::{FEATURE_PACK_FILE, load_repository, parse_feature_pack};
pub use state::{STATE_DIR, STATE_FILE, StateFile};
