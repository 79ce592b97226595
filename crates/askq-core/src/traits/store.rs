// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot store trait for persistence backends (JSON file, SQLite).

use async_trait::async_trait;

use crate::error::AskqError;
use crate::types::Snapshot;

/// Reads and writes one full serialized queue state.
///
/// There is no partial update: every save replaces the whole snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Loads the persisted snapshot.
    ///
    /// Returns `None` when nothing has been saved yet or when the stored
    /// snapshot cannot be read or decoded. Failures are logged here and
    /// never surfaced to the caller.
    async fn load(&self) -> Option<Snapshot>;

    /// Replaces the persisted snapshot with `snapshot`.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), AskqError>;

    /// Removes the persisted snapshot, if any.
    async fn clear(&self) -> Result<(), AskqError>;
}
