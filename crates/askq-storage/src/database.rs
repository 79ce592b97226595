// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use askq_core::AskqError;
use tracing::debug;

use crate::migrations::run_migrations;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;
PRAGMA foreign_keys = ON;";

/// Convert a tokio-rusqlite error into AskqError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AskqError {
    AskqError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the askq SQLite database.
///
/// Wraps the single `tokio_rusqlite::Connection` every query goes through.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, AskqError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(AskqError::storage)?;
            }
        }

        // Migrations run on a short-lived blocking connection before the
        // shared writer connection is opened.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AskqError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(AskqError::storage)?;
            conn.execute_batch(PRAGMAS).map_err(AskqError::storage)?;
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| AskqError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(AskqError::storage)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// Returns the shared connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), AskqError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}
