// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand: store, resolver and the queue service.

use std::time::Duration;

use askq_config::model::AskqConfig;
use askq_core::AskqError;
use askq_queue::shutdown::{drain_service, install_signal_handler};
use askq_queue::{QueueHandle, QueueService};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound on the final flush at exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the interval dispatcher runs for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Auto,
    Off,
}

/// A running queue service owned by this process.
pub struct Runtime {
    pub handle: QueueHandle,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Runtime {
    /// Opens the configured store and resolver and spawns the service.
    ///
    /// Fails with [`AskqError::StoreLocked`] when another process owns the
    /// JSON snapshot.
    pub async fn start(config: &AskqConfig, dispatch: Dispatch) -> Result<Self, AskqError> {
        let store = askq_storage::open_store(&config.storage).await?;
        let resolver = askq_resolver::build_resolver(&config.resolver)?;

        let service = QueueService::load(config.queue.clone(), store, resolver).await;
        let service = match dispatch {
            Dispatch::Auto => service,
            Dispatch::Off => service.without_dispatcher(),
        };

        let cancel = install_signal_handler();
        let (handle, task) = service.spawn(cancel.clone());
        Ok(Self {
            handle,
            task,
            cancel,
        })
    }

    /// True once a signal has asked the process to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the service after its final flush and releases the store.
    pub async fn stop(self) {
        if let Err(e) = self.handle.shutdown().await {
            // Already stopped by a signal; the task flushed on its own.
            debug!(error = %e, "queue service already stopped");
        }
        drain_service(self.task, DRAIN_TIMEOUT).await;
        self.cancel.cancel();
    }
}
