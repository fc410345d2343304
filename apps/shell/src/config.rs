use config::{Config, Environment, File};
use herald_logger::LogSettings;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File looked up in the working directory when no path is given. Any
/// extension `config` understands is accepted (`herald.toml`, `herald.json`).
pub const DEFAULT_CONFIG_FILE: &str = "herald";

/// Prefix for environment overrides: `HERALD__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "HERALD";

#[herald_derive::herald_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Top-level configuration of the `herald` binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub logging: LogSettings,
    pub dispatch: DispatchSettings,
}

/// Dispatcher knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Deliver concurrent publishes one at a time across threads.
    pub serialize_publish: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self { serialize_publish: true }
    }
}

/// Loads a configuration value from a file layered with environment overrides.
///
/// 1. **File**: `path` when given, which must exist. Otherwise
///    [`DEFAULT_CONFIG_FILE`] in the working directory, skipped when absent.
/// 2. **Environment**: variables prefixed with `HERALD__`; nested keys are
///    separated by double underscores (`HERALD__DISPATCH__SERIALIZE_PUBLISH`
///    maps to `dispatch.serialize_publish`).
///
/// # Errors
/// * The explicit file is missing or unreadable.
/// * A source does not deserialize into `T`.
///
/// # Example
/// ```rust
/// use herald_shell::config::{ShellConfig, load_config};
///
/// let cfg: ShellConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    debug!(path = %effective_path.display(), required, "Loading configuration");

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
