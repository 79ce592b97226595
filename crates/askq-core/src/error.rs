// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the askq request queue.

use thiserror::Error;

/// The primary error type used across askq crates.
#[derive(Debug, Error)]
pub enum AskqError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot store errors (file I/O, database failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Another process already owns the snapshot at this path.
    #[error("snapshot store is locked by another owner: {path}")]
    StoreLocked { path: String },

    /// Snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Submitted text exceeds the configured length bound.
    #[error("request text is {len} characters, limit is {max}")]
    RequestTooLong { len: usize, max: usize },

    /// Quick-submit named a category the resolver does not know.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// The owning queue service has stopped and no longer accepts commands.
    #[error("queue service is not running")]
    ServiceClosed,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AskqError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}

impl From<serde_json::Error> for AskqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
