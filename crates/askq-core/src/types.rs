// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the queue, its stores, and its resolvers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Number of transcript entries kept in a persisted snapshot.
pub const DEFAULT_TRANSCRIPT_CAP: usize = 100;

/// Number of queue events kept in a persisted snapshot.
pub const DEFAULT_EVENT_LOG_CAP: usize = 50;

/// Identifier assigned to a request on submission. Starts at 1.
pub type RequestId = u64;

/// Identity of the client session that submitted a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four characters of the id, used in compact queue listings.
    pub fn short_tag(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A submitted text item awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
    pub client_id: ClientId,
}

/// The resolved answer to a request, addressed to the submitting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: RequestId,
    pub text: String,
    pub original_text: String,
    pub client_id: ClientId,
    pub produced_at: DateTime<Utc>,
}

/// One completed exchange in the shared transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub user: String,
    pub bot: String,
    pub time: DateTime<Utc>,
    pub client_id: ClientId,
}

impl TranscriptEntry {
    /// Wall-clock time formatted for chat display.
    pub fn clock_time(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// Kind of operational event recorded in the event log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventAction {
    Enqueued,
    Dispatched,
}

/// An enqueue or dispatch marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub time: DateTime<Utc>,
    pub action: EventAction,
    /// Pending queue length right after the event.
    pub queue_size: usize,
    pub request_id: RequestId,
}

/// An answer produced by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Category of the procedure that matched, `None` for the default help.
    pub category: Option<String>,
    pub text: String,
}

/// A quick-submit shortcut: a category and one representative keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub keyword: String,
}

/// Serialized form of the whole queue state.
///
/// Timestamps exist as wall-clock values only here; the in-memory state
/// tracks intervals on a monotonic clock. Activity stamps are kept as raw
/// strings so a single malformed entry does not invalidate the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pending: Vec<Request>,
    #[serde(default)]
    pub in_flight: Vec<Request>,
    #[serde(default)]
    pub outbox: Vec<Response>,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub event_log: Vec<QueueEvent>,
    #[serde(default)]
    pub total_submitted: u64,
    #[serde(default)]
    pub total_processed: u64,
    #[serde(default)]
    pub activity: BTreeMap<String, String>,
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub last_dispatch_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// An empty snapshot stamped with the given creation time.
    pub fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            pending: Vec::new(),
            in_flight: Vec::new(),
            outbox: Vec::new(),
            transcript: Vec::new(),
            event_log: Vec::new(),
            total_submitted: 0,
            total_processed: 0,
            activity: BTreeMap::new(),
            started_at,
            last_dispatch_at: None,
        }
    }

    /// Drops all but the most recent `transcript_cap` transcript entries and
    /// `event_log_cap` events, keeping their order.
    pub fn truncate(&mut self, transcript_cap: usize, event_log_cap: usize) {
        keep_last(&mut self.transcript, transcript_cap);
        keep_last(&mut self.event_log, event_log_cap);
    }
}

/// Keeps only the last `cap` items of `items`.
pub fn keep_last<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}
