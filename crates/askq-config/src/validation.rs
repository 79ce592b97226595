// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, non-zero intervals, and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::{AskqConfig, StoreBackend};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AskqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` must be one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.queue.inactivity_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.inactivity_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.queue.transcript_cap == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.transcript_cap must be greater than 0".to_string(),
        });
    }

    if config.queue.max_request_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.max_request_chars must be greater than 0".to_string(),
        });
    }

    if config.queue.command_buffer == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.command_buffer must be greater than 0".to_string(),
        });
    }

    if config.queue.response_ttl_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message: "queue.response_ttl_secs must be greater than 0 when set".to_string(),
        });
    }

    if config.client.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "client.poll_interval_ms must be greater than 0".to_string(),
        });
    }

    // Only the path of the selected backend has to be usable.
    match config.storage.backend {
        StoreBackend::Json if config.storage.snapshot_path.trim().is_empty() => {
            errors.push(ConfigError::Validation {
                message: "storage.snapshot_path must not be empty".to_string(),
            });
        }
        StoreBackend::Sqlite if config.storage.database_path.trim().is_empty() => {
            errors.push(ConfigError::Validation {
                message: "storage.database_path must not be empty".to_string(),
            });
        }
        _ => {}
    }

    if matches!(&config.resolver.catalog_path, Some(path) if path.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "resolver.catalog_path must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
