// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a well-formed backend URL and non-zero poll timings.

use crate::diagnostic::ConfigError;
use crate::model::CivicaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CivicaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let url = config.client.backend_url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.backend_url must not be empty".to_string(),
        });
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("client.backend_url `{url}` must start with http:// or https://"),
        });
    }

    if config.client.language.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.language must not be empty".to_string(),
        });
    }

    if config.client.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.polling.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "polling.max_attempts must be at least 1".to_string(),
        });
    }

    if config.polling.retry_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "polling.retry_interval_secs must be at least 1".to_string(),
        });
    }

    if config.polling.cooldown_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "polling.cooldown_secs must be at least 1".to_string(),
        });
    }

    let level = config.log.level.trim();
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{level}` is not one of: trace, debug, info, warn, error"
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CivicaConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_backend_url_fails_validation() {
        let mut config = CivicaConfig::default();
        config.client.backend_url = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("backend_url"))
        ));
    }

    #[test]
    fn non_http_backend_url_fails_validation() {
        let mut config = CivicaConfig::default();
        config.client.backend_url = "ftp://legal.example".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("backend_url"))
        ));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let mut config = CivicaConfig::default();
        config.polling.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))
        ));
    }

    #[test]
    fn zero_cooldown_fails_validation() {
        let mut config = CivicaConfig::default();
        config.polling.cooldown_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("cooldown_secs"))
        ));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = CivicaConfig::default();
        config.log.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log.level"))
        ));
    }

    #[test]
    fn collects_all_errors_without_failing_fast() {
        let mut config = CivicaConfig::default();
        config.client.backend_url = "".to_string();
        config.polling.max_attempts = 0;
        config.polling.retry_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
