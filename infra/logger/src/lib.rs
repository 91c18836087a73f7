//! # Logger
//!
//! Installs the global `tracing` subscriber for the provisioning tools.
//! Console output goes to stderr so command output on stdout stays machine-readable;
//! file output uses a non-blocking rolling appender, optionally as JSON lines.
//! `RUST_LOG` is honored when no explicit filter is configured.
//!
//! ## Example
//!
//! ```rust
//! # use fpm_logger::{LogSettings, Logger};
//!
//! let settings = LogSettings { level: "debug".to_owned(), ..LogSettings::default() };
//! let _logger = Logger::init("fpm", &settings).unwrap();
//! ```

mod error;
mod settings;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::settings::{LogRotation, LogSettings};
pub use tracing::level_filters::LevelFilter;

use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_SUFFIX: &str = "log";

/// A handle to the initialized logging system.
///
/// Holds the background worker guard of the file appender. Drop it only when the
/// application is shutting down.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Installs the global subscriber described by `settings`.
    ///
    /// `name` prefixes rolling log files (e.g., `fpm.2026-10-16.log`).
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid settings,
    /// [`LoggerError::Io`] if the log directory cannot be created, and
    /// [`LoggerError::Subscriber`] if a global subscriber has already been set.
    pub fn init(name: &str, settings: &LogSettings) -> Result<Self, LoggerError> {
        if name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        settings.validate()?;

        let env_filter = build_env_filter(settings)?;
        let mut layers = Vec::new();

        if settings.console {
            layers.push(layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed());
        }

        let guard = if let Some(dir) = &settings.dir {
            fs::create_dir_all(dir)
                .context(format!("Failed to create log directory {}", dir.display()))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(settings.rotation.into())
                .filename_prefix(name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(settings.max_files)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = layer().with_writer(non_blocking).with_ansi(false);
            layers.push(if settings.json { file_layer.json().boxed() } else { file_layer.boxed() });
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name, "Logging initialized");

        Ok(Self { guard })
    }

    /// Returns the file appender worker guard, if file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn build_env_filter(settings: &LogSettings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level_filter()?.into());
    settings.filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid log filter '{filter}': {e}").into(),
                context: None,
            })
        },
    )
}
