use config::{Config, Environment, File};
use fpm_logger::LogSettings;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "fpm.toml";

/// Prefix of environment overrides, e.g. `FPM__INSTALL_DIR` or `FPM__LOGGING__LEVEL`.
pub const ENV_PREFIX: &str = "FPM";

#[fpm_derive::fpm_error]
pub enum SettingsError {
    #[error("Settings error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// ```toml
/// repository = "/srv/feature-packs"
/// install_dir = "/opt/server"
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for `feature-pack.toml` documents.
    pub repository: PathBuf,
    pub install_dir: PathBuf,
    pub logging: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("repository"),
            install_dir: PathBuf::from("."),
            logging: LogSettings { level: "warn".to_owned(), ..LogSettings::default() },
        }
    }
}

/// Layers the settings file (required only when given explicitly) with `FPM__*` variables.
///
/// # Errors
/// Returns [`SettingsError::Config`] when an explicit file is missing, a file is malformed
/// or a value has the wrong type.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let file = path.map_or_else(
        || File::from(Path::new(DEFAULT_SETTINGS_FILE)).required(false),
        |path| File::from(path).required(true),
    );

    let settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build settings")?
        .try_deserialize::<Settings>()
        .context("Failed to deserialize settings")?;

    debug!(?settings, "Settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fpm.toml");
        fs::write(&path, "repository = \"packs\"\n\n[logging]\nlevel = \"debug\"\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.repository, PathBuf::from("packs"));
        assert_eq!(settings.install_dir, PathBuf::from("."));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(SettingsError::Config { .. })));
    }
}
