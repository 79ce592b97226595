// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot persistence for the askq request queue.
//!
//! Two [`SnapshotStore`] backends are provided: a JSON document written via
//! temp file and rename ([`JsonFileStore`]), and a single-row SQLite table
//! behind tokio-rusqlite's single writer thread ([`SqliteStore`]). Both hold
//! an [`OwnerLock`] so only one process serves a given snapshot.

pub mod database;
pub mod json_store;
pub mod lock;
pub mod migrations;
pub mod sqlite_store;

use std::sync::Arc;

use askq_config::model::{StorageConfig, StoreBackend};
use askq_core::{AskqError, SnapshotStore};
use tracing::info;

pub use database::Database;
pub use json_store::JsonFileStore;
pub use lock::OwnerLock;
pub use sqlite_store::SqliteStore;

/// Open the backend selected in `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn SnapshotStore>, AskqError> {
    let store: Arc<dyn SnapshotStore> = match config.backend {
        StoreBackend::Json => Arc::new(JsonFileStore::open(&config.snapshot_path)?),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.database_path).await?),
    };
    info!(backend = store.name(), "snapshot store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_store_honors_backend_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig {
            backend: StoreBackend::Json,
            snapshot_path: dir.path().join("q.json").display().to_string(),
            database_path: dir.path().join("q.db").display().to_string(),
        };

        let json = open_store(&config).await.unwrap();
        assert_eq!(json.name(), "json");

        config.backend = StoreBackend::Sqlite;
        let sqlite = open_store(&config).await.unwrap();
        assert_eq!(sqlite.name(), "sqlite");
    }

    #[tokio::test]
    async fn both_backends_refuse_a_second_owner() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig {
            backend: StoreBackend::Sqlite,
            snapshot_path: dir.path().join("q.json").display().to_string(),
            database_path: dir.path().join("q.db").display().to_string(),
        };

        let _sqlite = open_store(&config).await.unwrap();
        assert!(matches!(
            open_store(&config).await.err().unwrap(),
            AskqError::StoreLocked { .. }
        ));

        config.backend = StoreBackend::Json;
        let _json = open_store(&config).await.unwrap();
        assert!(matches!(
            open_store(&config).await.err().unwrap(),
            AskqError::StoreLocked { .. }
        ));
    }
}
