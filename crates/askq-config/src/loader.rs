// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./askq.toml` > `~/.config/askq/askq.toml` > `/etc/askq/askq.toml`
//! with environment variable overrides via `ASKQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AskqConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/askq/askq.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "askq.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/askq/askq.toml` (system-wide)
/// 3. `~/.config/askq/askq.toml` (user XDG config)
/// 4. `./askq.toml` (local directory)
/// 5. `ASKQ_*` environment variables
pub fn load_config() -> Result<AskqConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<AskqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AskqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AskqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AskqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AskqConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/askq/askq.toml`, when a config directory exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("askq").join("askq.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `ASKQ_QUEUE_MIN_DISPATCH_INTERVAL_MS` must map to
/// `queue.min_dispatch_interval_ms`, not `queue.min.dispatch...`.
fn env_provider() -> Env {
    Env::prefixed("ASKQ_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("client_", "client.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("resolver_", "resolver.", 1);
        mapped.into()
    })
}
