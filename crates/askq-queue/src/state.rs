// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory queue state and its conversion to and from [`Snapshot`].
//!
//! Liveness and dispatch spacing are tracked with monotonic instants. Wall
//! clock values only appear in request/response stamps and at the snapshot
//! boundary, where a [`Now`] pair anchors one clock to the other.

use std::collections::{BTreeMap, VecDeque};

use askq_core::types::keep_last;
use askq_core::{
    ClientId, QueueEvent, Request, Response, Snapshot, TranscriptEntry, DEFAULT_EVENT_LOG_CAP,
    DEFAULT_TRANSCRIPT_CAP,
};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::warn;

/// A reading of both clocks taken at the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    pub mono: Instant,
    pub wall: DateTime<Utc>,
}

impl Now {
    pub fn capture() -> Self {
        Self {
            mono: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Wall-clock time of a past monotonic instant.
    pub fn wall_of(&self, instant: Instant) -> DateTime<Utc> {
        let age = self.mono.saturating_duration_since(instant);
        match chrono::Duration::from_std(age) {
            Ok(age) => self.wall - age,
            Err(_) => self.wall,
        }
    }

    /// Monotonic instant of a wall-clock stamp. Stamps in the future clamp to
    /// now; stamps older than the monotonic clock can express yield `None`.
    pub fn instant_of(&self, wall: DateTime<Utc>) -> Option<Instant> {
        let age = (self.wall - wall).to_std().unwrap_or_default();
        self.mono.checked_sub(age)
    }
}

/// The root aggregate owned by the queue service.
#[derive(Debug, Clone)]
pub struct QueueState {
    pub pending: VecDeque<Request>,
    /// Empty except during a dispatch step, or after loading a snapshot
    /// written mid-dispatch.
    pub in_flight: Vec<Request>,
    pub outbox: Vec<Response>,
    pub activity: BTreeMap<ClientId, Instant>,
    pub transcript: Vec<TranscriptEntry>,
    pub event_log: Vec<QueueEvent>,
    pub total_submitted: u64,
    pub total_processed: u64,
    pub last_dispatch_at: Option<Instant>,
    pub started_at: DateTime<Utc>,
    pub transcript_cap: usize,
    pub event_log_cap: usize,
}

impl QueueState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: Vec::new(),
            outbox: Vec::new(),
            activity: BTreeMap::new(),
            transcript: Vec::new(),
            event_log: Vec::new(),
            total_submitted: 0,
            total_processed: 0,
            last_dispatch_at: None,
            started_at,
            transcript_cap: DEFAULT_TRANSCRIPT_CAP,
            event_log_cap: DEFAULT_EVENT_LOG_CAP,
        }
    }

    pub fn with_caps(mut self, transcript_cap: usize, event_log_cap: usize) -> Self {
        self.transcript_cap = transcript_cap;
        self.event_log_cap = event_log_cap;
        keep_last(&mut self.transcript, transcript_cap);
        keep_last(&mut self.event_log, event_log_cap);
        self
    }

    /// Rebuilds state from a snapshot. Activity entries whose stamp cannot
    /// be parsed or placed on the monotonic clock are dropped; the count is
    /// returned alongside the state.
    pub fn from_snapshot(snapshot: Snapshot, now: Now) -> (Self, usize) {
        let mut dropped = 0;
        let mut activity = BTreeMap::new();
        for (client, stamp) in snapshot.activity {
            let instant = DateTime::parse_from_rfc3339(&stamp)
                .ok()
                .and_then(|t| now.instant_of(t.with_timezone(&Utc)));
            match instant {
                Some(instant) => {
                    activity.insert(ClientId(client), instant);
                }
                None => {
                    warn!(client_id = %client, stamp = %stamp, "dropping unusable activity stamp");
                    dropped += 1;
                }
            }
        }

        let state = Self {
            pending: snapshot.pending.into(),
            in_flight: snapshot.in_flight,
            outbox: snapshot.outbox,
            activity,
            transcript: snapshot.transcript,
            event_log: snapshot.event_log,
            total_submitted: snapshot.total_submitted,
            total_processed: snapshot.total_processed,
            last_dispatch_at: snapshot.last_dispatch_at.and_then(|t| now.instant_of(t)),
            started_at: snapshot.started_at,
            transcript_cap: DEFAULT_TRANSCRIPT_CAP,
            event_log_cap: DEFAULT_EVENT_LOG_CAP,
        };
        (state, dropped)
    }

    /// Serializable form of the state, truncated to the configured caps.
    pub fn to_snapshot(&self, now: Now) -> Snapshot {
        let mut snapshot = Snapshot {
            pending: self.pending.iter().cloned().collect(),
            in_flight: self.in_flight.clone(),
            outbox: self.outbox.clone(),
            transcript: self.transcript.clone(),
            event_log: self.event_log.clone(),
            total_submitted: self.total_submitted,
            total_processed: self.total_processed,
            activity: self
                .activity
                .iter()
                .map(|(client, at)| (client.0.clone(), now.wall_of(*at).to_rfc3339()))
                .collect(),
            started_at: self.started_at,
            last_dispatch_at: self.last_dispatch_at.map(|at| now.wall_of(at)),
        };
        snapshot.truncate(self.transcript_cap, self.event_log_cap);
        snapshot
    }
}
