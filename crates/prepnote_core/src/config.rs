//! Core configuration loading.
//!
//! # Responsibility
//! - Describe tunables for logging, history depth and store location.
//! - Load them from an optional JSON file with environment overrides.
//!
//! # Invariants
//! - A missing config file yields defaults; a malformed one is an error.
//! - `max_history` is always at least 1 after validation.
//! - `log_level` is always normalized to `trace|debug|info|warn|error`.

use crate::editor::history::MAX_HISTORY;
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding `log_level`.
pub const ENV_LOG_LEVEL: &str = "PREPNOTE_LOG_LEVEL";

/// Runtime configuration for the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Snapshots kept per editing session.
    pub max_history: usize,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file for the note store; in-memory when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            log_level: default_log_level().to_string(),
            log_dir: None,
            store_path: None,
        }
    }
}

/// Configuration load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Loads configuration from `path`, applying process environment overrides.
///
/// # Errors
/// - `Io` when the file exists but cannot be read.
/// - `Parse` for malformed JSON or unknown fields.
/// - `Invalid` when validation fails.
pub fn load_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    let config = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        CoreConfig::default()
    };

    resolve(config, |key| std::env::var(key).ok())
}

/// Applies overrides from `lookup` and validates the result.
pub fn resolve<F>(mut config: CoreConfig, lookup: F) -> Result<CoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
        config.log_level = level;
    }

    config.log_level = normalize_level(&config.log_level)
        .map_err(ConfigError::Invalid)?
        .to_string();
    if config.max_history == 0 {
        return Err(ConfigError::Invalid(
            "max_history must be at least 1".to_string(),
        ));
    }
    if let Some(dir) = &config.log_dir {
        if !dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "log_dir must be an absolute path, got `{}`",
                dir.display()
            )));
        }
    }
    Ok(config)
}
