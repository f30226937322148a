//! Validates an [`ExchangeRuntimeConfig`], accumulating every violation
//! found rather than stopping at the first one.

use crate::ExchangeRuntimeConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("exchange.name must not be empty")]
    EmptyExchangeName,

    #[error("durable_writer.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("durable_writer.max_retries must be greater than zero")]
    ZeroMaxRetries,

    #[error("broadcast.channel_capacity must be greater than zero")]
    ZeroBroadcastCapacity,

    #[error("backup.directory must not be empty")]
    EmptyBackupDirectory,

    #[error("logging.format must be one of pretty, json, compact, got '{0}'")]
    InvalidLogFormat(String),

    #[error("logging.level must be one of trace, debug, info, warn, error, got '{0}'")]
    InvalidLogLevel(String),
}

/// Validates the configuration, returning every violation found.
///
/// Unlike a fail-fast validator, this collects all problems so an operator
/// fixing a config file sees every mistake in one pass instead of one per
/// edit-reload cycle.
pub fn validate(config: &ExchangeRuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.exchange.name.trim().is_empty() {
        errors.push(ValidationError::EmptyExchangeName);
    }

    if config.durable_writer.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    if config.durable_writer.max_retries == 0 {
        errors.push(ValidationError::ZeroMaxRetries);
    }

    if config.broadcast.channel_capacity == 0 {
        errors.push(ValidationError::ZeroBroadcastCapacity);
    }

    if config.backup.directory.trim().is_empty() {
        errors.push(ValidationError::EmptyBackupDirectory);
    }

    match config.logging.format.as_str() {
        "pretty" | "json" | "compact" => {}
        other => errors.push(ValidationError::InvalidLogFormat(other.to_string())),
    }

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => errors.push(ValidationError::InvalidLogLevel(other.to_string())),
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::generate_default_config;

    #[test]
    fn default_config_is_valid() {
        let cfg = generate_default_config();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let mut cfg = generate_default_config();
        cfg.durable_writer.queue_capacity = 0;
        let errors = validate(&cfg).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ZeroQueueCapacity));
    }

    #[test]
    fn rejects_invalid_log_format() {
        let mut cfg = generate_default_config();
        cfg.logging.format = "xml".to_string();
        let errors = validate(&cfg).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidLogFormat(f) if f == "xml")));
    }

    #[test]
    fn accumulates_multiple_errors() {
        let mut cfg = generate_default_config();
        cfg.exchange.name = String::new();
        cfg.durable_writer.queue_capacity = 0;
        cfg.logging.format = "nonsense".to_string();
        let errors = validate(&cfg).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
