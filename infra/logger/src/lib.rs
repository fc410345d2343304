//! # Logger
//!
//! Installs the process-wide `tracing` subscriber from a [`LogSettings`] value.
//!
//! * Console output is a compact, colored layer.
//! * File output uses a rolling, non-blocking appender; lines can be JSON.
//! * The level is the default directive. `filter` adds module directives
//!   (`herald_events=trace`); without it, `RUST_LOG` is honored.
//!
//! `LogSettings` deserializes with serde, so it can sit in an application's
//! configuration file under a `[logging]` table.
//!
//! ## Example
//!
//! ```rust
//! use herald_logger::{LogSettings, Logger};
//!
//! let settings = LogSettings { level: "debug".into(), ..LogSettings::default() };
//! let _logger = Logger::init("my-app", &settings).unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<Rotation> for rolling::Rotation {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Minutely => Self::MINUTELY,
            Rotation::Hourly => Self::HOURLY,
            Rotation::Daily => Self::DAILY,
            Rotation::Never => Self::NEVER,
        }
    }
}

/// Logging configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level: `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub level: String,
    /// Extra `EnvFilter` directives, e.g. `herald_events=trace`.
    pub filter: Option<String>,
    pub console: bool,
    /// Directory for rolling log files. No file output when unset.
    pub directory: Option<PathBuf>,
    pub rotation: Rotation,
    pub max_files: usize,
    /// Write file output as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            directory: None,
            rotation: Rotation::Daily,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        }
    }
}

impl LogSettings {
    /// Parses [`LogSettings::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LevelFilter::from_str(self.level.trim()).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Invalid level '{}': {e}", self.level).into(),
            context: None,
        })
    }

    fn validate(&self, name: &str) -> Result<(), LoggerError> {
        if name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        if !self.console && self.directory.is_none() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable console or set a directory.".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level_filter()?.into());
        self.filter.as_ref().map_or_else(
            || Ok(builder.from_env_lossy()),
            |directives| {
                builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                    message: format!("Invalid filter '{directives}': {e}").into(),
                    context: None,
                })
            },
        )
    }
}

/// Handle to the installed logging system.
///
/// Holds the file writer's [`WorkerGuard`]; keep it alive until shutdown so
/// buffered lines are flushed.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Installs the global subscriber.
    ///
    /// `name` prefixes rolling log files (`<name>.2026-10-18.log`).
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`,
    ///   no enabled output, or an unparsable level/filter.
    /// * [`LoggerError::Internal`] if the log directory cannot be created.
    /// * [`LoggerError::Appender`] if the rolling appender cannot start.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(name: &str, settings: &LogSettings) -> Result<Self, LoggerError> {
        settings.validate(name)?;
        let env_filter = settings.env_filter()?;

        let mut layers = Vec::new();

        if settings.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = if let Some(directory) = &settings.directory {
            fs::create_dir_all(directory).map_err(|e| LoggerError::Internal {
                message: e.to_string().into(),
                context: Some(format!("Failed to create log directory: {}", directory.display()).into()),
            })?;

            let appender = RollingFileAppender::builder()
                .rotation(settings.rotation.into())
                .filename_prefix(name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(settings.max_files)
                .build(directory)
                .context("Building rolling file appender")?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = layer().with_writer(writer).with_ansi(false);

            layers.push(if settings.json { file_layer.json().boxed() } else { file_layer.boxed() });
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        tracing::debug!(name, level = %settings.level, "Logging initialized");
        Ok(Self { guard })
    }

    /// The file writer guard, when file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_info_to_console() {
        let settings = LogSettings::default();

        assert!(settings.console);
        assert!(settings.directory.is_none());
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::INFO);
        assert_eq!(settings.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn settings_deserialize_with_partial_input() {
        let settings: LogSettings = serde_json::from_value(serde_json::json!({
            "level": "debug",
            "directory": "/tmp/herald-logs",
            "rotation": "hourly",
            "json": true
        }))
        .unwrap();

        assert_eq!(settings.level_filter().unwrap(), LevelFilter::DEBUG);
        assert_eq!(settings.rotation, Rotation::Hourly);
        assert!(settings.json);
        assert!(settings.console, "unspecified fields keep their defaults");
    }

    #[test]
    fn unknown_level_is_rejected() {
        let settings = LogSettings { level: "loud".into(), ..LogSettings::default() };
        assert!(matches!(settings.level_filter(), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let settings =
            LogSettings { filter: Some("herald=notalevel".into()), ..LogSettings::default() };
        assert!(matches!(settings.env_filter(), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn validation_catches_unusable_settings() {
        let settings = LogSettings::default();
        assert!(settings.validate("  ").is_err());

        let settings = LogSettings { max_files: 0, ..LogSettings::default() };
        assert!(settings.validate("app").is_err());

        let settings = LogSettings { console: false, ..LogSettings::default() };
        assert!(settings.validate("app").is_err());

        let settings = LogSettings {
            console: false,
            directory: Some(PathBuf::from("logs")),
            ..LogSettings::default()
        };
        assert!(settings.validate("app").is_ok());
    }
}
