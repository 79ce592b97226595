// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for askq.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level askq configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AskqConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Queue timing and capacity settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Client polling behavior.
    #[serde(default)]
    pub client: ClientConfig,

    /// Snapshot persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Procedure resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "askq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Queue timing and capacity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Minimum time between two successful dispatches, in milliseconds.
    #[serde(default = "default_min_dispatch_interval_ms")]
    pub min_dispatch_interval_ms: u64,

    /// Clients without a heartbeat for this long are evicted from the
    /// activity table. Used by every sweep.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Transcript entries kept in memory and in snapshots.
    #[serde(default = "default_transcript_cap")]
    pub transcript_cap: usize,

    /// Queue events kept in memory and in snapshots.
    #[serde(default = "default_event_log_cap")]
    pub event_log_cap: usize,

    /// Longest accepted request text, in characters.
    #[serde(default = "default_max_request_chars")]
    pub max_request_chars: usize,

    /// Never-retrieved responses older than this are dropped. `None` keeps
    /// them until retrieved.
    #[serde(default)]
    pub response_ttl_secs: Option<u64>,

    /// Capacity of the service command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl QueueConfig {
    pub fn min_dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.min_dispatch_interval_ms)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn response_ttl(&self) -> Option<Duration> {
        self.response_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_dispatch_interval_ms: default_min_dispatch_interval_ms(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            transcript_cap: default_transcript_cap(),
            event_log_cap: default_event_log_cap(),
            max_request_chars: default_max_request_chars(),
            response_ttl_secs: None,
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_min_dispatch_interval_ms() -> u64 {
    3000
}

fn default_inactivity_timeout_secs() -> u64 {
    30
}

fn default_transcript_cap() -> usize {
    100
}

fn default_event_log_cap() -> usize {
    50
}

fn default_max_request_chars() -> usize {
    2000
}

fn default_command_buffer() -> usize {
    256
}

/// Client polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Delay between two response polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on how long a client waits for one response, in seconds.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_wait_secs() -> u64 {
    60
}

/// Snapshot backend selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON document written via temp file and rename.
    #[default]
    Json,
    /// One blob row in a SQLite database.
    Sqlite,
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Which backend holds the snapshot.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path of the JSON snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            snapshot_path: default_snapshot_path(),
            database_path: default_database_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    data_file("shared_queue.json")
}

fn default_database_path() -> String {
    data_file("askq.db")
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("askq").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .display()
        .to_string()
}

/// Keyword matching strategy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStrategy {
    /// A keyword matches anywhere inside the lowercased text.
    #[default]
    Substring,
    /// A keyword matches only on word boundaries.
    Word,
}

/// Procedure resolver configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// How keywords are matched against request text.
    #[serde(default)]
    pub strategy: MatchStrategy,

    /// TOML catalog replacing the built-in procedures. `None` uses the
    /// built-in catalog.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = AskqConfig::default();
        assert_eq!(config.queue.min_dispatch_interval(), Duration::from_secs(3));
        assert_eq!(config.queue.inactivity_timeout(), Duration::from_secs(30));
        assert_eq!(config.client.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.queue.transcript_cap, 100);
        assert_eq!(config.queue.event_log_cap, 50);
        assert!(config.queue.response_ttl().is_none());
    }

    #[test]
    fn backend_and_strategy_parse_lowercase() {
        use std::str::FromStr;
        assert_eq!(StoreBackend::from_str("sqlite").unwrap(), StoreBackend::Sqlite);
        assert_eq!(MatchStrategy::from_str("word").unwrap(), MatchStrategy::Word);
        assert_eq!(StoreBackend::Json.to_string(), "json");
    }

    #[test]
    fn storage_section_deserializes() {
        let toml_str = r#"
[storage]
backend = "sqlite"
database_path = "/tmp/q.db"
"#;
        let config: AskqConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.backend, StoreBackend::Sqlite);
        assert_eq!(config.storage.database_path, "/tmp/q.db");
        assert!(config.storage.snapshot_path.ends_with("shared_queue.json"));
    }

    #[test]
    fn queue_deny_unknown_fields() {
        let toml_str = r#"
[queue]
min_dispatch_intervall_ms = 10
"#;
        assert!(toml::from_str::<AskqConfig>(toml_str).is_err());
    }
}
