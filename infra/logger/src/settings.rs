use crate::error::LoggerError;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;

const DEFAULT_MAX_FILES: usize = 10;

/// Logging settings as they appear in the application configuration.
///
/// ```toml
/// [logging]
/// level = "debug"
/// filter = "fpm_resolver=trace"
/// dir = "logs"
/// rotation = "hourly"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Default level for every target (`error`, `warn`, `info`, `debug`, `trace`, `off`).
    pub level: String,
    /// Extra `EnvFilter` directives, e.g. `fpm_resolver=debug`.
    pub filter: Option<String>,
    /// Human-readable output on stderr.
    pub console: bool,
    /// JSON lines in the log files.
    pub json: bool,
    /// Directory for rolling log files; no file output when absent.
    pub dir: Option<PathBuf>,
    pub rotation: LogRotation,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            json: false,
            dir: None,
            rotation: LogRotation::default(),
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl LogSettings {
    /// Parses [`LogSettings::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        self.level.trim().parse::<LevelFilter>().map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Unknown log level '{}': {e}", self.level).into(),
            context: None,
        })
    }

    pub(crate) fn validate(&self) -> Result<(), LoggerError> {
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        if !self.console && self.dir.is_none() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable console or set a log directory.".into(),
                context: None,
            });
        }
        Ok(())
    }
}

/// Rolling policy for log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}
