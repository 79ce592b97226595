// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue service: a single task that owns the [`QueueState`].
//!
//! Callers hold a cloneable [`QueueHandle`] and send commands over a bounded
//! mpsc channel; every command carries a oneshot reply. Commands are applied
//! one at a time, so no two callers can interleave a read-modify-write.
//! Mutating commands are flushed to the [`SnapshotStore`] before replying.
//!
//! Besides explicit `dispatch` commands, the service runs a dispatcher that
//! wakes exactly when the throttle next allows a dispatch, so the queue
//! drains at one request per minimum interval with no client attached.

use std::sync::Arc;
use std::time::Duration;

use askq_config::model::QueueConfig;
use askq_core::{
    AskqError, Category, ClientId, Resolver, Response, SnapshotStore, TranscriptEntry,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::manager::{self, DispatchOutcome, Health, QueuePreview, Stats, SubmitOutcome};
use crate::persist::{load_state, save_state};
use crate::state::{Now, QueueState};

/// Shortest idle wake-up of the dispatcher, used when the configured
/// interval is zero.
const MIN_TICK: Duration = Duration::from_millis(50);

/// Reply to a mutating command.
///
/// `value` is the result of the operation, which is complete in memory.
/// `flush_error` is set when persisting the new state failed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    pub value: T,
    pub flush_error: Option<String>,
}

impl<T> Applied<T> {
    pub fn is_flushed(&self) -> bool {
        self.flush_error.is_none()
    }
}

enum Command {
    Submit {
        text: String,
        client_id: ClientId,
        reply: oneshot::Sender<Result<Applied<SubmitOutcome>, AskqError>>,
    },
    QuickSubmit {
        category: String,
        client_id: ClientId,
        reply: oneshot::Sender<Result<Applied<SubmitOutcome>, AskqError>>,
    },
    Dispatch {
        reply: oneshot::Sender<Applied<DispatchOutcome>>,
    },
    PositionOf {
        client_id: ClientId,
        reply: oneshot::Sender<usize>,
    },
    Retrieve {
        client_id: ClientId,
        reply: oneshot::Sender<Applied<Option<Response>>>,
    },
    Heartbeat {
        client_id: ClientId,
        reply: oneshot::Sender<Applied<()>>,
    },
    Stats {
        reply: oneshot::Sender<Stats>,
    },
    Health {
        reply: oneshot::Sender<Health>,
    },
    History {
        client_id: ClientId,
        reply: oneshot::Sender<Vec<TranscriptEntry>>,
    },
    Preview {
        limit: usize,
        reply: oneshot::Sender<QueuePreview>,
    },
    Categories {
        reply: oneshot::Sender<Vec<Category>>,
    },
    Reset {
        reply: oneshot::Sender<Applied<()>>,
    },
    Purge {
        reply: oneshot::Sender<Result<(), AskqError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable client side of the queue service.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<Command>,
}

impl QueueHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, AskqError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| AskqError::ServiceClosed)?;
        rx.await.map_err(|_| AskqError::ServiceClosed)
    }

    pub async fn submit(
        &self,
        text: impl Into<String>,
        client_id: &ClientId,
    ) -> Result<Applied<SubmitOutcome>, AskqError> {
        let text = text.into();
        let client_id = client_id.clone();
        self.request(|reply| Command::Submit {
            text,
            client_id,
            reply,
        })
        .await?
    }

    /// Submits the representative keyword of `category`, matched by
    /// category name (case-insensitive) or by the keyword itself.
    pub async fn quick_submit(
        &self,
        category: impl Into<String>,
        client_id: &ClientId,
    ) -> Result<Applied<SubmitOutcome>, AskqError> {
        let category = category.into();
        let client_id = client_id.clone();
        self.request(|reply| Command::QuickSubmit {
            category,
            client_id,
            reply,
        })
        .await?
    }

    pub async fn dispatch(&self) -> Result<Applied<DispatchOutcome>, AskqError> {
        self.request(|reply| Command::Dispatch { reply }).await
    }

    pub async fn position_of(&self, client_id: &ClientId) -> Result<usize, AskqError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::PositionOf { client_id, reply })
            .await
    }

    pub async fn retrieve(
        &self,
        client_id: &ClientId,
    ) -> Result<Applied<Option<Response>>, AskqError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::Retrieve { client_id, reply })
            .await
    }

    pub async fn heartbeat(&self, client_id: &ClientId) -> Result<Applied<()>, AskqError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::Heartbeat { client_id, reply })
            .await
    }

    pub async fn stats(&self) -> Result<Stats, AskqError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    pub async fn health(&self) -> Result<Health, AskqError> {
        self.request(|reply| Command::Health { reply }).await
    }

    pub async fn history(&self, client_id: &ClientId) -> Result<Vec<TranscriptEntry>, AskqError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::History { client_id, reply })
            .await
    }

    pub async fn preview(&self, limit: usize) -> Result<QueuePreview, AskqError> {
        self.request(|reply| Command::Preview { limit, reply }).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, AskqError> {
        self.request(|reply| Command::Categories { reply }).await
    }

    /// Clears pending, in-flight and undelivered requests.
    pub async fn reset(&self) -> Result<Applied<()>, AskqError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Forgets the whole queue state, counters and transcript included, and
    /// removes the persisted snapshot. Nothing is written back until the
    /// next change.
    pub async fn purge(&self) -> Result<(), AskqError> {
        self.request(|reply| Command::Purge { reply }).await?
    }

    /// Stops the service after a final flush.
    pub async fn shutdown(&self) -> Result<(), AskqError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Owner of the queue state.
pub struct QueueService {
    state: QueueState,
    config: QueueConfig,
    store: Arc<dyn SnapshotStore>,
    resolver: Arc<dyn Resolver>,
    auto_dispatch: bool,
    /// Set by a purge, cleared by the next flush.
    purged: bool,
}

impl QueueService {
    /// Loads the persisted state from `store`.
    pub async fn load(
        config: QueueConfig,
        store: Arc<dyn SnapshotStore>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        let state = load_state(store.as_ref(), &config, Now::capture()).await;
        Self {
            state,
            config,
            store,
            resolver,
            auto_dispatch: true,
            purged: false,
        }
    }

    /// Disables the interval dispatcher; requests are then only resolved by
    /// explicit `dispatch` commands.
    pub fn without_dispatcher(mut self) -> Self {
        self.auto_dispatch = false;
        self
    }

    /// Spawns the service task. It runs until `cancel` fires, a `shutdown`
    /// command arrives, or every handle is dropped.
    pub fn spawn(self, cancel: CancellationToken) -> (QueueHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.command_buffer.max(1));
        let task = tokio::spawn(self.run(rx, cancel));
        (QueueHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let idle = self.config.min_dispatch_interval().max(MIN_TICK);
        let dispatcher = tokio::time::sleep_until(self.next_dispatch_at(idle));
        tokio::pin!(dispatcher);

        info!(
            store = self.store.name(),
            dispatch_interval_ms = self.config.min_dispatch_interval_ms,
            auto_dispatch = self.auto_dispatch,
            "queue service running"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping queue service");
                    break;
                }
                cmd = rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown { reply }) => {
                            self.final_flush().await;
                            let _ = reply.send(());
                            info!("queue service stopped");
                            return;
                        }
                        Some(cmd) => {
                            self.handle(cmd).await;
                            // New work may be dispatchable before the idle wake-up.
                            let next = self.next_dispatch_at(idle);
                            if next < dispatcher.deadline() {
                                dispatcher.as_mut().reset(next);
                            }
                        }
                        None => {
                            debug!("all queue handles dropped");
                            break;
                        }
                    }
                }
                () = &mut dispatcher, if self.auto_dispatch => {
                    self.tick().await;
                    dispatcher.as_mut().reset(self.next_dispatch_at(idle));
                }
            }
        }

        self.final_flush().await;
        info!("queue service stopped");
    }

    /// When the dispatcher should next wake: as soon as the throttle allows
    /// while requests are pending, otherwise after `idle`.
    fn next_dispatch_at(&self, idle: Duration) -> Instant {
        let now = Instant::now();
        if self.state.pending.is_empty() {
            return now + idle;
        }
        match self.state.last_dispatch_at {
            Some(last) => (last + self.config.min_dispatch_interval()).max(now),
            None => now,
        }
    }

    async fn tick(&mut self) {
        if self.state.pending.is_empty() {
            return;
        }
        let outcome = manager::dispatch_one(
            &mut self.state,
            self.resolver.as_ref(),
            self.config.min_dispatch_interval(),
            Now::capture(),
        );
        match outcome {
            DispatchOutcome::Dispatched(_) => {
                self.flush().await;
            }
            DispatchOutcome::Throttled { retry_in } => {
                debug!(retry_in_ms = retry_in.as_millis() as u64, "dispatch throttled");
            }
            DispatchOutcome::Empty => {}
        }
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Submit {
                text,
                client_id,
                reply,
            } => {
                let result = self.submit(&text, &client_id).await;
                let _ = reply.send(result);
            }
            Command::QuickSubmit {
                category,
                client_id,
                reply,
            } => {
                let result = match self.keyword_for(&category) {
                    Some(keyword) => self.submit(&keyword, &client_id).await,
                    None => Err(AskqError::UnknownCategory(category)),
                };
                let _ = reply.send(result);
            }
            Command::Dispatch { reply } => {
                let value = manager::dispatch_one(
                    &mut self.state,
                    self.resolver.as_ref(),
                    self.config.min_dispatch_interval(),
                    Now::capture(),
                );
                let flush_error = match value {
                    DispatchOutcome::Dispatched(_) => self.flush().await,
                    _ => None,
                };
                let _ = reply.send(Applied { value, flush_error });
            }
            Command::PositionOf { client_id, reply } => {
                let _ = reply.send(manager::position_of(&self.state, &client_id));
            }
            Command::Retrieve { client_id, reply } => {
                let value = manager::retrieve_response(&mut self.state, &client_id, Now::capture());
                let flush_error = match value {
                    Some(_) => self.flush().await,
                    None => None,
                };
                let _ = reply.send(Applied { value, flush_error });
            }
            Command::Heartbeat { client_id, reply } => {
                manager::heartbeat(&mut self.state, &client_id, Now::capture());
                let flush_error = self.flush().await;
                let _ = reply.send(Applied {
                    value: (),
                    flush_error,
                });
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            Command::Health { reply } => {
                let stats = self.stats();
                let _ = reply.send(manager::health(stats.pending_count));
            }
            Command::History { client_id, reply } => {
                let _ = reply.send(manager::history_for(&self.state, &client_id));
            }
            Command::Preview { limit, reply } => {
                let _ = reply.send(manager::queue_preview(&self.state, limit));
            }
            Command::Categories { reply } => {
                let _ = reply.send(self.resolver.categories());
            }
            Command::Reset { reply } => {
                manager::clear_queues(&mut self.state);
                let flush_error = self.flush().await;
                let _ = reply.send(Applied {
                    value: (),
                    flush_error,
                });
            }
            Command::Purge { reply } => {
                self.state = QueueState::new(Now::capture().wall);
                let result = self.store.clear().await;
                match &result {
                    Ok(()) => {
                        self.purged = true;
                        info!(store = self.store.name(), "queue state purged");
                    }
                    Err(e) => error!(store = self.store.name(), error = %e, "failed to clear store"),
                }
                let _ = reply.send(result);
            }
            // Intercepted by the run loop before reaching here.
            Command::Shutdown { .. } => {}
        }
    }

    async fn submit(
        &mut self,
        text: &str,
        client_id: &ClientId,
    ) -> Result<Applied<SubmitOutcome>, AskqError> {
        let value = manager::submit(
            &mut self.state,
            text,
            client_id,
            self.config.max_request_chars,
            Now::capture(),
        )?;
        let flush_error = match value {
            SubmitOutcome::Enqueued { .. } => self.flush().await,
            SubmitOutcome::Ignored => None,
        };
        Ok(Applied { value, flush_error })
    }

    /// Sweep, optional response expiry, then counters.
    fn stats(&mut self) -> Stats {
        let now = Now::capture();
        if let Some(ttl) = self.config.response_ttl() {
            manager::expire_responses(&mut self.state, ttl, now);
        }
        manager::stats(&mut self.state, self.config.inactivity_timeout(), now)
    }

    fn keyword_for(&self, category: &str) -> Option<String> {
        let wanted = category.trim().to_lowercase();
        self.resolver
            .categories()
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted || c.keyword == wanted)
            .map(|c| c.keyword)
    }

    /// Flush on exit, unless a purge left nothing to keep.
    async fn final_flush(&mut self) {
        if self.purged {
            debug!("store was purged, skipping final flush");
        } else {
            self.flush().await;
        }
    }

    /// Persists the full state. Returns the error text on failure; the
    /// in-memory state is kept either way.
    async fn flush(&mut self) -> Option<String> {
        match save_state(self.store.as_ref(), &self.state, Now::capture()).await {
            Ok(()) => {
                self.purged = false;
                None
            }
            Err(e) => {
                error!(store = self.store.name(), error = %e, "failed to persist queue state");
                Some(e.to_string())
            }
        }
    }
}
