// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL shape, page size bounds, and poll intervals.

use crate::diagnostic::ConfigError;
use crate::model::BalcaoConfig;

/// Messages-per-detail cap enforced by the backend.
const MESSAGES_LIMIT_MAX: u32 = 100;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BalcaoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate base_url is present and uses an HTTP scheme
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "api.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("api.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.api.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "api.timeout_secs must be at least 1".to_string(),
        });
    }

    // Validate list page size bounds
    if config.inbox.page_size == 0 || config.inbox.page_size > 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "inbox.page_size must be between 1 and 100, got {}",
                config.inbox.page_size
            ),
        });
    }

    // Validate messages limit against the backend cap
    if config.inbox.messages_limit == 0 || config.inbox.messages_limit > MESSAGES_LIMIT_MAX {
        errors.push(ConfigError::Validation {
            message: format!(
                "inbox.messages_limit must be between 1 and {MESSAGES_LIMIT_MAX}, got {}",
                config.inbox.messages_limit
            ),
        });
    }

    if config.inbox.search_debounce_ms > 10_000 {
        errors.push(ConfigError::Validation {
            message: format!(
                "inbox.search_debounce_ms must be at most 10000, got {}",
                config.inbox.search_debounce_ms
            ),
        });
    }

    // Validate poll intervals are not tight loops
    if config.bridge.poll_interval_ms < 250 {
        errors.push(ConfigError::Validation {
            message: format!(
                "bridge.poll_interval_ms must be at least 250, got {}",
                config.bridge.poll_interval_ms
            ),
        });
    }

    if config.import.poll_interval_ms < 250 {
        errors.push(ConfigError::Validation {
            message: format!(
                "import.poll_interval_ms must be at least 250, got {}",
                config.import.poll_interval_ms
            ),
        });
    }

    if config.bridge.refresh_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "bridge.refresh_interval_secs must be at least 1".to_string(),
        });
    }

    // Validate log level is a recognized tracing level
    let level = config.log.level.trim().to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level must be one of trace, debug, info, warn, error; got `{}`",
                config.log.level
            ),
        });
    }

    let format = config.log.format.trim().to_ascii_lowercase();
    if !matches!(format.as_str(), "pretty" | "json") {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.format must be `pretty` or `json`, got `{}`",
                config.log.format
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
