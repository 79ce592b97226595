// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client sessions: one identity talking to the queue service.
//!
//! A session keeps no conversation state of its own. History is read back
//! from the service's transcript.

use std::time::Duration;

use askq_config::model::ClientConfig;
use askq_core::{AskqError, ClientId, Response, TranscriptEntry};
use rand::Rng;
use tracing::debug;

use crate::manager::SubmitOutcome;
use crate::service::{Applied, QueueHandle};

/// Generates a display identity of the form `Student_NNNN`.
pub fn generate_client_id() -> ClientId {
    let n: u16 = rand::thread_rng().gen_range(1000..=9999);
    ClientId(format!("Student_{n}"))
}

/// One client of the queue service.
#[derive(Clone)]
pub struct ClientSession {
    id: ClientId,
    handle: QueueHandle,
    poll_interval: Duration,
}

impl ClientSession {
    /// Creates a session, generating an id when none is given.
    pub fn new(handle: QueueHandle, id: Option<ClientId>, config: &ClientConfig) -> Self {
        Self {
            id: id.unwrap_or_else(generate_client_id),
            handle,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn handle(&self) -> &QueueHandle {
        &self.handle
    }

    pub async fn ask(&self, text: &str) -> Result<Applied<SubmitOutcome>, AskqError> {
        self.handle.submit(text, &self.id).await
    }

    pub async fn quick_ask(&self, category: &str) -> Result<Applied<SubmitOutcome>, AskqError> {
        self.handle.quick_submit(category, &self.id).await
    }

    /// Marks the client alive and takes its oldest waiting response, if any.
    pub async fn poll_once(&self) -> Result<Option<Response>, AskqError> {
        self.handle.heartbeat(&self.id).await?;
        Ok(self.handle.retrieve(&self.id).await?.value)
    }

    /// Polls until a response arrives, nothing is left that could produce
    /// one, or `max_wait` elapses.
    ///
    /// Keeps waiting while this client still has a pending request, while
    /// the queue is non-empty, or while a dispatch is in flight.
    pub async fn wait_for_response(
        &self,
        max_wait: Duration,
    ) -> Result<Option<Response>, AskqError> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            // Queue status is read before polling so a dispatch landing in
            // between is still picked up by this round's retrieve.
            let position = self.handle.position_of(&self.id).await?;
            let stats = self.handle.stats().await?;
            if let Some(response) = self.poll_once().await? {
                return Ok(Some(response));
            }

            let more_to_come =
                position > 0 || stats.pending_count > 0 || stats.in_flight_count > 0;
            if !more_to_come {
                debug!(client_id = %self.id, "nothing left to wait for");
                return Ok(None);
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                debug!(client_id = %self.id, position, "gave up waiting for a response");
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// This client's exchanges from the service transcript, oldest first.
    pub async fn history(&self) -> Result<Vec<TranscriptEntry>, AskqError> {
        self.handle.history(&self.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_student_prefix_and_four_digits() {
        for _ in 0..50 {
            let id = generate_client_id();
            let digits = id.as_str().strip_prefix("Student_").unwrap();
            assert_eq!(digits.len(), 4);
            let n: u16 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }
}
