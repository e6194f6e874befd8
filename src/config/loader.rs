//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{LogFormat, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";
pub const ADMIN_API_KEY_ENV: &str = "ADMIN_API_KEY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Backend client error: {0}")]
    Backend(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    let mut errors = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Err(mut invalid) = validate_config(&config) {
        errors.append(&mut invalid);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Apply overrides from `lookup`. Empty values are ignored; values that
/// cannot be applied are returned as errors.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(BACKEND_URL_ENV) {
        config.backend.url = url;
    }
    if let Some(url) = get(DATABASE_URL_ENV) {
        config.database.url = Some(url);
    }
    if let Some(addr) = get(BIND_ADDRESS_ENV) {
        config.listener.bind_address = addr;
    }
    if let Some(key) = get(ADMIN_API_KEY_ENV) {
        config.admin.api_key = Some(key);
    }
    if let Some(format) = get(LOG_FORMAT_ENV) {
        match format.to_ascii_lowercase().as_str() {
            "json" => config.observability.log_format = LogFormat::Json,
            "pretty" => config.observability.log_format = LogFormat::Pretty,
            other => errors.push(ValidationError::new(
                "observability.log_format",
                format!("{LOG_FORMAT_ENV}={other} is not one of: pretty, json"),
            )),
        }
    }

    errors
}
