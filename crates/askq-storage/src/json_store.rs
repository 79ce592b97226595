// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot store backed by a single JSON document.
//!
//! Saves go through a sibling temp file that is fsynced and renamed over
//! the target, so a reader never observes a half-written snapshot. The
//! store holds an exclusive advisory lock on `<path>.lock` for its whole
//! lifetime; a second owner of the same path is refused with
//! [`AskqError::StoreLocked`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use askq_core::{AskqError, Snapshot, SnapshotStore};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::lock::{sibling, OwnerLock};

/// JSON-file snapshot store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    _lock: OwnerLock,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories and taking the
    /// owner lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AskqError> {
        let path = path.as_ref().to_path_buf();
        let lock = OwnerLock::acquire(&path)?;
        debug!(path = %path.display(), "json snapshot store opened");
        Ok(Self { path, _lock: lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = sibling(path, "tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn load(&self) -> Option<Snapshot> {
        let path = self.path.clone();
        let bytes = match tokio::task::spawn_blocking(move || fs::read(path)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => return None,
            Ok(Err(e)) => {
                warn!(path = %self.path.display(), error = %e, "failed to read snapshot");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "snapshot read task failed");
                return None;
            }
        };

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot is unreadable, starting empty");
                None
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), AskqError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| AskqError::Internal(format!("snapshot write task failed: {e}")))?
            .map_err(AskqError::storage)?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AskqError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AskqError::storage(e)),
        }
    }
}
