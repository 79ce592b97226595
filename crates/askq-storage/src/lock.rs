// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-owner exclusion for snapshot stores.
//!
//! Every store holds an exclusive advisory lock on `<path>.lock` for its
//! whole lifetime. The queue service keeps the full state in memory and
//! writes it back wholesale, so two owners of one path would overwrite each
//! other's submissions; the second owner is refused instead.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use askq_core::AskqError;
use fs2::FileExt;
use tracing::debug;

/// Held exclusive lock on `<path>.lock`. Released on drop.
#[derive(Debug)]
pub struct OwnerLock {
    file: File,
    path: PathBuf,
}

impl OwnerLock {
    /// Creates the parent directory of `path` and locks `<path>.lock`.
    ///
    /// Fails with [`AskqError::StoreLocked`] when another owner holds it.
    pub fn acquire(path: &Path) -> Result<Self, AskqError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(AskqError::storage)?;
            }
        }

        let lock_path = sibling(path, "lock");
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(AskqError::storage)?;

        if file.try_lock_exclusive().is_err() {
            return Err(AskqError::StoreLocked {
                path: path.display().to_string(),
            });
        }

        debug!(lock = %lock_path.display(), "store owner lock taken");
        Ok(Self {
            file,
            path: lock_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OwnerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// `<path>.<ext>` next to the store file.
pub(crate) fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
