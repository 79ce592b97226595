// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot store backed by one row of a SQLite table.
//!
//! The whole snapshot is stored as a JSON body in row `id = 1`. Every save
//! bumps `revision`, which lets operators see how often the queue persisted.
//! Like the JSON store, the store owns `<database_path>.lock` while open, so
//! a second process serving the same database is refused.

use std::path::Path;

use askq_core::{AskqError, Snapshot, SnapshotStore};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::database::{map_tr_err, Database};
use crate::lock::OwnerLock;

/// SQLite snapshot store.
pub struct SqliteStore {
    db: Database,
    _lock: OwnerLock,
}

impl SqliteStore {
    /// Take the owner lock, then open the database at `path` and run
    /// migrations.
    pub async fn open(path: &str) -> Result<Self, AskqError> {
        let lock = OwnerLock::acquire(Path::new(path))?;
        let db = Database::open(path).await?;
        Ok(Self { db, _lock: lock })
    }

    /// Number of saves recorded for the current snapshot row, 0 when empty.
    pub async fn revision(&self) -> Result<i64, AskqError> {
        self.db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                let revision = conn
                    .query_row("SELECT revision FROM snapshot WHERE id = 1", [], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(revision.unwrap_or(0))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the underlying database.
    pub async fn close(self) -> Result<(), AskqError> {
        self.db.close().await
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self) -> Option<Snapshot> {
        let body = self
            .db
            .connection()
            .call(|conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row("SELECT body FROM snapshot WHERE id = 1", [], |row| {
                    row.get(0)
                })
                .optional()
            })
            .await;

        let body = match body {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %self.db.path(), error = %e, "failed to read snapshot row");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&body) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %self.db.path(), error = %e, "snapshot row is unreadable, starting empty");
                None
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), AskqError> {
        let body = serde_json::to_string(snapshot)?;
        let saved_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO snapshot (id, body, saved_at, revision) VALUES (1, ?1, ?2, 1)
                     ON CONFLICT(id) DO UPDATE SET
                        body = excluded.body,
                        saved_at = excluded.saved_at,
                        revision = snapshot.revision + 1",
                    params![body, saved_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %self.db.path(), "snapshot saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AskqError> {
        self.db
            .connection()
            .call(|conn| {
                conn.execute("DELETE FROM snapshot", [])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
