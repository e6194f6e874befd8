//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for values that parse but cannot work.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.backend.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "backend.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "backend.url",
            format!("'{}' is not a valid URL: {}", config.backend.url, e),
        )),
    }

    if config.backend.timeout_secs == Some(0) {
        errors.push(ValidationError::new("backend.timeout_secs", "must be greater than 0"));
    }

    if config.relay.max_text_chars == 0 {
        errors.push(ValidationError::new("relay.max_text_chars", "must be greater than 0"));
    }

    if config.relay.max_body_bytes == 0 {
        errors.push(ValidationError::new("relay.max_body_bytes", "must be greater than 0"));
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be greater than 0"));
    }

    if matches!(config.database.url.as_deref(), Some(url) if url.trim().is_empty()) {
        errors.push(ValidationError::new("database.url", "must not be empty when set"));
    }

    if matches!(config.admin.api_key.as_deref(), Some(key) if key.trim().is_empty()) {
        errors.push(ValidationError::new("admin.api_key", "must not be empty when set"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
