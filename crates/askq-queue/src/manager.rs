// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue manager: the pure operations applied to a [`QueueState`].
//!
//! Every function takes the current time explicitly, never reads a clock
//! and never performs I/O. The queue service is the only caller in
//! production; tests drive these functions directly.

use std::time::Duration;

use askq_core::types::keep_last;
use askq_core::{
    AskqError, ClientId, EventAction, QueueEvent, Request, RequestId, Resolver, Response,
    TranscriptEntry,
};
use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use crate::state::{Now, QueueState};

/// Number of characters shown in a queue preview line.
pub const PREVIEW_CHARS: usize = 25;

/// Result of [`submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The request was appended to `pending` at the given 1-based position.
    Enqueued { id: RequestId, position: usize },
    /// The text was empty after trimming; nothing changed.
    Ignored,
}

/// Result of [`dispatch_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched(RequestId),
    /// Nothing pending.
    Empty,
    /// The previous dispatch was too recent.
    Throttled { retry_in: Duration },
}

/// Counters reported by [`stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub pending_count: usize,
    pub in_flight_count: usize,
    pub outbox_count: usize,
    pub total_processed: u64,
    pub active_count: usize,
    /// Uptime divided by processed count; a coarse average, 0 before the
    /// first dispatch.
    pub avg_processing_time: f64,
    pub uptime_seconds: u64,
}

/// Load bucket derived from the pending count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub level: HealthLevel,
    pub message: String,
}

/// One line of the queue listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    pub position: usize,
    pub client_tag: String,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuePreview {
    pub entries: Vec<PreviewEntry>,
    /// Pending requests beyond the listed ones.
    pub remaining: usize,
}

/// Appends a request from `client_id`.
///
/// Empty text is ignored. Text longer than `max_chars` characters is
/// rejected without touching the state.
pub fn submit(
    state: &mut QueueState,
    text: &str,
    client_id: &ClientId,
    max_chars: usize,
    now: Now,
) -> Result<SubmitOutcome, AskqError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(SubmitOutcome::Ignored);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(AskqError::RequestTooLong {
            len,
            max: max_chars,
        });
    }

    let id = state.total_submitted + 1;
    state.pending.push_back(Request {
        id,
        text: text.to_string(),
        submitted_at: now.wall,
        client_id: client_id.clone(),
    });
    state.total_submitted = id;
    state.activity.insert(client_id.clone(), now.mono);
    record_event(state, EventAction::Enqueued, id, now);

    let position = state.pending.len();
    info!(client_id = %client_id, request_id = id, position, "request enqueued");
    Ok(SubmitOutcome::Enqueued { id, position })
}

/// Resolves the oldest pending request, at most once per `min_interval`.
pub fn dispatch_one(
    state: &mut QueueState,
    resolver: &dyn Resolver,
    min_interval: Duration,
    now: Now,
) -> DispatchOutcome {
    if let Some(last) = state.last_dispatch_at {
        let elapsed = now.mono.saturating_duration_since(last);
        if elapsed < min_interval {
            return DispatchOutcome::Throttled {
                retry_in: min_interval - elapsed,
            };
        }
    }

    let Some(request) = state.pending.pop_front() else {
        return DispatchOutcome::Empty;
    };
    state.in_flight.push(request.clone());

    let answer = resolver.resolve(&request.text);
    state.outbox.push(Response {
        id: request.id,
        text: answer.text,
        original_text: request.text.clone(),
        client_id: request.client_id.clone(),
        produced_at: now.wall,
    });
    state.in_flight.retain(|r| r.id != request.id);
    state.total_processed += 1;
    state.last_dispatch_at = Some(now.mono);
    record_event(state, EventAction::Dispatched, request.id, now);

    info!(
        request_id = request.id,
        client_id = %request.client_id,
        category = answer.category.as_deref().unwrap_or("default"),
        "request dispatched"
    );
    DispatchOutcome::Dispatched(request.id)
}

/// 1-based rank of the first pending request from `client_id`, 0 if none.
pub fn position_of(state: &QueueState, client_id: &ClientId) -> usize {
    state
        .pending
        .iter()
        .position(|r| &r.client_id == client_id)
        .map_or(0, |idx| idx + 1)
}

/// Removes the oldest response addressed to `client_id` and records the
/// exchange in the transcript.
pub fn retrieve_response(
    state: &mut QueueState,
    client_id: &ClientId,
    now: Now,
) -> Option<Response> {
    let idx = state.outbox.iter().position(|r| &r.client_id == client_id)?;
    let response = state.outbox.remove(idx);
    state.transcript.push(TranscriptEntry {
        user: response.original_text.clone(),
        bot: response.text.clone(),
        time: now.wall,
        client_id: client_id.clone(),
    });
    keep_last(&mut state.transcript, state.transcript_cap);
    debug!(client_id = %client_id, request_id = response.id, "response retrieved");
    Some(response)
}

/// Evicts activity entries older than `timeout`. Returns how many went.
pub fn clean_inactive(state: &mut QueueState, timeout: Duration, now: Now) -> usize {
    let before = state.activity.len();
    state
        .activity
        .retain(|_, last| now.mono.saturating_duration_since(*last) <= timeout);
    let evicted = before - state.activity.len();
    if evicted > 0 {
        debug!(evicted, "inactive clients swept");
    }
    evicted
}

pub fn heartbeat(state: &mut QueueState, client_id: &ClientId, now: Now) {
    state.activity.insert(client_id.clone(), now.mono);
}

/// Sweeps inactive clients, then reports counters.
pub fn stats(state: &mut QueueState, timeout: Duration, now: Now) -> Stats {
    clean_inactive(state, timeout, now);

    let uptime_seconds = (now.wall - state.started_at).num_seconds().max(0) as u64;
    let avg_processing_time = if state.total_processed > 0 {
        uptime_seconds as f64 / state.total_processed as f64
    } else {
        0.0
    };

    Stats {
        pending_count: state.pending.len(),
        in_flight_count: state.in_flight.len(),
        outbox_count: state.outbox.len(),
        total_processed: state.total_processed,
        active_count: state.activity.len(),
        avg_processing_time,
        uptime_seconds,
    }
}

pub fn health(pending_count: usize) -> Health {
    let (level, message) = match pending_count {
        0 => (HealthLevel::Excellent, "No waiting requests".to_string()),
        1..=3 => (
            HealthLevel::Good,
            format!("{pending_count} request(s) in queue"),
        ),
        4..=7 => (
            HealthLevel::Moderate,
            format!("{pending_count} requests waiting"),
        ),
        _ => (
            HealthLevel::Heavy,
            format!("{pending_count} requests - high traffic"),
        ),
    };
    Health { level, message }
}

pub fn peek_next(state: &QueueState) -> Option<&Request> {
    state.pending.front()
}

/// The first `limit` pending requests in compact form.
pub fn queue_preview(state: &QueueState, limit: usize) -> QueuePreview {
    let entries = state
        .pending
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, r)| PreviewEntry {
            position: idx + 1,
            client_tag: r.client_id.short_tag().to_string(),
            preview: shorten(&r.text),
        })
        .collect();
    QueuePreview {
        entries,
        remaining: state.pending.len().saturating_sub(limit),
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Drops every pending, in-flight and undelivered request. Counters,
/// activity and transcript are kept.
pub fn clear_queues(state: &mut QueueState) {
    let dropped = state.pending.len() + state.in_flight.len() + state.outbox.len();
    state.pending.clear();
    state.in_flight.clear();
    state.outbox.clear();
    info!(dropped, "queues cleared");
}

/// Transcript entries of one client, oldest first.
pub fn history_for(state: &QueueState, client_id: &ClientId) -> Vec<TranscriptEntry> {
    state
        .transcript
        .iter()
        .filter(|e| &e.client_id == client_id)
        .cloned()
        .collect()
}

/// Drops responses produced more than `ttl` ago. Returns how many went.
pub fn expire_responses(state: &mut QueueState, ttl: Duration, now: Now) -> usize {
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return 0;
    };
    let cutoff = now.wall - ttl;
    let before = state.outbox.len();
    state.outbox.retain(|r| r.produced_at >= cutoff);
    let expired = before - state.outbox.len();
    if expired > 0 {
        info!(expired, "abandoned responses expired");
    }
    expired
}

/// Puts requests left in flight by an interrupted dispatch back at the head
/// of `pending`, unless their response already exists.
pub fn recover_in_flight(state: &mut QueueState) -> usize {
    let mut recovered = 0;
    for request in std::mem::take(&mut state.in_flight).into_iter().rev() {
        if state.outbox.iter().any(|r| r.id == request.id)
            || state.pending.iter().any(|r| r.id == request.id)
        {
            continue;
        }
        info!(request_id = request.id, client_id = %request.client_id, "recovered in-flight request");
        state.pending.push_front(request);
        recovered += 1;
    }
    recovered
}

fn record_event(state: &mut QueueState, action: EventAction, request_id: RequestId, now: Now) {
    state.event_log.push(QueueEvent {
        time: now.wall,
        action,
        queue_size: state.pending.len(),
        request_id,
    });
    keep_last(&mut state.event_log, state.event_log_cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use askq_core::{Answer, Category};

    const MIN_INTERVAL: Duration = Duration::from_secs(3);
    const TIMEOUT: Duration = Duration::from_secs(30);
    const MAX_CHARS: usize = 2000;

    /// Two procedures, enough to tell matches from the fallback.
    struct TestResolver;

    impl Resolver for TestResolver {
        fn lookup(&self, text: &str) -> Option<Answer> {
            text.to_lowercase().contains("enroll").then(|| Answer {
                category: Some("Enrollment".into()),
                text: "enrollment steps".into(),
            })
        }

        fn default_help(&self) -> Answer {
            Answer {
                category: None,
                text: "default help".into(),
            }
        }

        fn categories(&self) -> Vec<Category> {
            vec![Category {
                name: "Enrollment".into(),
                keyword: "enroll".into(),
            }]
        }
    }

    fn client(name: &str) -> ClientId {
        ClientId::from(name)
    }

    fn fresh() -> (QueueState, Now) {
        let now = Now::capture();
        (QueueState::new(now.wall), now)
    }

    fn later(now: Now, by: Duration) -> Now {
        Now {
            mono: now.mono + by,
            wall: now.wall + chrono::Duration::from_std(by).unwrap(),
        }
    }

    fn submit_ok(state: &mut QueueState, text: &str, who: &str, now: Now) -> RequestId {
        match submit(state, text, &client(who), MAX_CHARS, now).unwrap() {
            SubmitOutcome::Enqueued { id, .. } => id,
            SubmitOutcome::Ignored => panic!("submission was ignored"),
        }
    }

    #[tokio::test]
    async fn scenario_submit_on_empty_queue() {
        let (mut state, now) = fresh();
        let outcome = submit(&mut state, "How do I enroll?", &client("A"), MAX_CHARS, now).unwrap();
        assert_eq!(outcome, SubmitOutcome::Enqueued { id: 1, position: 1 });
        assert_eq!(position_of(&state, &client("A")), 1);
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.event_log.len(), 1);
        assert_eq!(state.event_log[0].action, EventAction::Enqueued);
        assert_eq!(state.event_log[0].queue_size, 1);
    }

    #[tokio::test]
    async fn scenario_first_dispatch_resolves_procedure() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "How do I enroll?", "A", now);

        let outcome = dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now);
        assert_eq!(outcome, DispatchOutcome::Dispatched(1));
        assert!(state.pending.is_empty());
        assert!(state.in_flight.is_empty());
        assert_eq!(state.outbox.len(), 1);
        assert_eq!(state.outbox[0].client_id, client("A"));
        assert_eq!(state.outbox[0].text, "enrollment steps");
        assert_eq!(state.outbox[0].original_text, "How do I enroll?");
        assert_eq!(state.total_processed, 1);
        assert_eq!(state.event_log.last().unwrap().action, EventAction::Dispatched);
    }

    #[tokio::test]
    async fn scenario_second_dispatch_is_throttled() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "How do I enroll?", "A", now);
        submit_ok(&mut state, "where are my grades", "B", later(now, Duration::from_secs(1)));

        let t = later(now, Duration::from_secs(1));
        assert_eq!(
            dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, t),
            DispatchOutcome::Dispatched(1)
        );
        let second = dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, t);
        assert_eq!(
            second,
            DispatchOutcome::Throttled {
                retry_in: MIN_INTERVAL
            }
        );
        assert_eq!(position_of(&state, &client("B")), 1);
        assert_eq!(state.pending.len(), 1);
    }

    #[tokio::test]
    async fn throttle_lifts_after_interval() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "one", "A", now);
        submit_ok(&mut state, "two", "B", now);
        dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now);

        let almost = later(now, Duration::from_millis(2999));
        assert!(matches!(
            dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, almost),
            DispatchOutcome::Throttled { retry_in } if retry_in == Duration::from_millis(1)
        ));
        let after = later(now, MIN_INTERVAL);
        assert_eq!(
            dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, after),
            DispatchOutcome::Dispatched(2)
        );
    }

    #[tokio::test]
    async fn scenario_unmatched_text_gets_default_help() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "xyz unmatched", "A", now);
        dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now);
        assert_eq!(state.outbox[0].text, TestResolver.default_help().text);
    }

    #[tokio::test]
    async fn scenario_idle_client_drops_out_of_active_count() {
        let (mut state, now) = fresh();
        heartbeat(&mut state, &client("A"), now);
        assert_eq!(stats(&mut state, TIMEOUT, now).active_count, 1);

        let idle = later(now, TIMEOUT + Duration::from_secs(1));
        assert_eq!(stats(&mut state, TIMEOUT, idle).active_count, 0);
    }

    #[tokio::test]
    async fn empty_queue_dispatch_is_empty_not_throttled() {
        let (mut state, now) = fresh();
        assert_eq!(
            dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now),
            DispatchOutcome::Empty
        );
        assert!(state.last_dispatch_at.is_none());
    }

    #[tokio::test]
    async fn blank_submission_is_ignored() {
        let (mut state, now) = fresh();
        let outcome = submit(&mut state, "   \n", &client("A"), MAX_CHARS, now).unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert_eq!(state.total_submitted, 0);
        assert!(state.activity.is_empty());
    }

    #[tokio::test]
    async fn overlong_submission_is_rejected_without_mutation() {
        let (mut state, now) = fresh();
        let text = "a".repeat(11);
        let err = submit(&mut state, &text, &client("A"), 10, now).unwrap_err();
        assert!(matches!(err, AskqError::RequestTooLong { len: 11, max: 10 }));
        assert!(state.pending.is_empty());
        assert_eq!(state.total_submitted, 0);
    }

    #[tokio::test]
    async fn retrieve_only_returns_own_response_and_records_transcript() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "enroll me", "A", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);

        assert!(retrieve_response(&mut state, &client("B"), now).is_none());
        assert!(state.transcript.is_empty());

        let response = retrieve_response(&mut state, &client("A"), now).unwrap();
        assert_eq!(response.id, 1);
        assert!(state.outbox.is_empty());
        assert_eq!(history_for(&state, &client("A")).len(), 1);
        assert!(history_for(&state, &client("B")).is_empty());
        assert!(retrieve_response(&mut state, &client("A"), now).is_none());
    }

    #[tokio::test]
    async fn transcript_stays_within_cap() {
        let (state, now) = fresh();
        let mut state = state.with_caps(3, 50);
        for i in 0..5 {
            submit_ok(&mut state, &format!("q{i}"), "A", now);
            dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);
            retrieve_response(&mut state, &client("A"), now);
        }
        let users: Vec<_> = state.transcript.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, ["q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn avg_processing_time_is_uptime_over_processed() {
        let (mut state, now) = fresh();
        assert_eq!(stats(&mut state, TIMEOUT, now).avg_processing_time, 0.0);

        submit_ok(&mut state, "a", "A", now);
        submit_ok(&mut state, "b", "A", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);

        let s = stats(&mut state, TIMEOUT, later(now, Duration::from_secs(10)));
        assert_eq!(s.uptime_seconds, 10);
        assert_eq!(s.avg_processing_time, 5.0);
        assert_eq!(s.outbox_count, 2);
    }

    #[test]
    fn health_buckets() {
        let cases = [
            (0, HealthLevel::Excellent, "No waiting requests"),
            (1, HealthLevel::Good, "1 request(s) in queue"),
            (3, HealthLevel::Good, "3 request(s) in queue"),
            (4, HealthLevel::Moderate, "4 requests waiting"),
            (7, HealthLevel::Moderate, "7 requests waiting"),
            (8, HealthLevel::Heavy, "8 requests - high traffic"),
        ];
        for (count, level, message) in cases {
            let h = health(count);
            assert_eq!(h.level, level, "pending {count}");
            assert_eq!(h.message, message);
        }
    }

    #[tokio::test]
    async fn preview_truncates_text_and_counts_remaining() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "short", "Student_1234", now);
        submit_ok(
            &mut state,
            "this question is definitely longer than the limit",
            "Student_9876",
            now,
        );
        submit_ok(&mut state, "third", "Student_5555", now);

        let preview = queue_preview(&state, 2);
        assert_eq!(preview.remaining, 1);
        assert_eq!(preview.entries[0].client_tag, "1234");
        assert_eq!(preview.entries[0].preview, "short");
        assert_eq!(preview.entries[1].position, 2);
        assert_eq!(preview.entries[1].preview, "this question is definite...");
        assert_eq!(peek_next(&state).map(|r| r.id), Some(1));
    }

    #[tokio::test]
    async fn clear_queues_keeps_counters_and_transcript() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "enroll", "A", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);
        retrieve_response(&mut state, &client("A"), now);
        submit_ok(&mut state, "b", "A", now);
        submit_ok(&mut state, "c", "B", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);

        clear_queues(&mut state);
        assert!(state.pending.is_empty());
        assert!(state.outbox.is_empty());
        assert_eq!(state.total_submitted, 3);
        assert_eq!(state.total_processed, 2);
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(submit_ok(&mut state, "d", "A", now), 4);
    }

    #[tokio::test]
    async fn expire_drops_only_old_responses() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "a", "A", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);
        let t = later(now, Duration::from_secs(60));
        submit_ok(&mut state, "b", "B", t);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, t);

        let expired = expire_responses(&mut state, Duration::from_secs(30), later(t, Duration::from_secs(1)));
        assert_eq!(expired, 1);
        assert_eq!(state.outbox.len(), 1);
        assert_eq!(state.outbox[0].client_id, client("B"));
    }

    #[tokio::test]
    async fn interrupted_dispatch_is_requeued_at_head() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "first", "A", now);
        submit_ok(&mut state, "second", "B", now);
        let head = state.pending.pop_front().unwrap();
        state.in_flight.push(head);

        assert_eq!(recover_in_flight(&mut state), 1);
        assert!(state.in_flight.is_empty());
        assert_eq!(state.pending.front().map(|r| r.id), Some(1));
        assert_eq!(position_of(&state, &client("A")), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn recovery_is_logged_with_request_id() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "first", "A", now);
        let head = state.pending.pop_front().unwrap();
        state.in_flight.push(head);

        recover_in_flight(&mut state);
        assert!(logs_contain("recovered in-flight request"));
        assert!(logs_contain("request_id=1"));
    }

    #[tokio::test]
    async fn in_flight_with_existing_response_is_not_requeued() {
        let (mut state, now) = fresh();
        submit_ok(&mut state, "first", "A", now);
        dispatch_one(&mut state, &TestResolver, Duration::ZERO, now);
        let response = &state.outbox[0];
        state.in_flight.push(Request {
            id: response.id,
            text: response.original_text.clone(),
            submitted_at: now.wall,
            client_id: response.client_id.clone(),
        });

        assert_eq!(recover_in_flight(&mut state), 0);
        assert!(state.pending.is_empty());
        assert!(state.in_flight.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn ids_increase_and_arrival_order_is_kept(
            texts in proptest::collection::vec("[a-z]{0,8}", 0..40),
        ) {
            let (mut state, now) = fresh();
            for (i, text) in texts.iter().enumerate() {
                let who = format!("Student_{i:04}");
                submit(&mut state, text, &client(&who), MAX_CHARS, now).unwrap();
            }
            let ids: Vec<_> = state.pending.iter().map(|r| r.id).collect();
            let expected: Vec<_> = (1..=ids.len() as u64).collect();
            proptest::prop_assert_eq!(ids, expected);
            let kept: Vec<_> = texts.iter().filter(|t| !t.is_empty()).cloned().collect();
            let queued: Vec<_> = state.pending.iter().map(|r| r.text.clone()).collect();
            proptest::prop_assert_eq!(queued, kept);
        }

        #[test]
        fn position_counts_requests_ahead(owners in proptest::collection::vec(0u8..4, 0..30)) {
            let (mut state, now) = fresh();
            for (i, owner) in owners.iter().enumerate() {
                submit(&mut state, &format!("q{i}"), &client(&format!("C{owner}")), MAX_CHARS, now).unwrap();
            }
            for owner in 0u8..4 {
                let expected = owners.iter().position(|o| *o == owner).map_or(0, |i| i + 1);
                proptest::prop_assert_eq!(position_of(&state, &client(&format!("C{owner}"))), expected);
            }
        }

        #[test]
        fn dispatches_are_spaced_by_min_interval(steps in proptest::collection::vec(0u64..2000, 1..40)) {
            let (mut state, start) = fresh();
            for i in 0..steps.len() {
                submit(&mut state, &format!("q{i}"), &client("A"), MAX_CHARS, start).unwrap();
            }
            let mut offset = 0u64;
            let mut last: Option<u64> = None;
            for step in steps {
                offset += step;
                let now = later(start, Duration::from_millis(offset));
                if let DispatchOutcome::Dispatched(_) = dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now) {
                    if let Some(prev) = last {
                        proptest::prop_assert!(offset - prev >= MIN_INTERVAL.as_millis() as u64);
                    }
                    last = Some(offset);
                }
            }
        }

        #[test]
        fn sweep_keeps_exactly_the_fresh_entries(ages in proptest::collection::vec(0u64..60, 0..20)) {
            let (mut state, start) = fresh();
            let horizon = 60u64;
            for (i, age) in ages.iter().enumerate() {
                let seen = later(start, Duration::from_secs(horizon - age));
                heartbeat(&mut state, &client(&format!("C{i}")), seen);
            }
            let now = later(start, Duration::from_secs(horizon));
            clean_inactive(&mut state, TIMEOUT, now);
            for (i, age) in ages.iter().enumerate() {
                let kept = state.activity.contains_key(&client(&format!("C{i}")));
                proptest::prop_assert_eq!(kept, Duration::from_secs(*age) <= TIMEOUT);
            }
        }
    }

    #[tokio::test]
    async fn instants_are_monotonic_clock() {
        // Dispatch spacing ignores wall-clock jumps.
        let (mut state, now) = fresh();
        submit_ok(&mut state, "a", "A", now);
        submit_ok(&mut state, "b", "A", now);
        dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, now);
        let skewed = Now {
            mono: now.mono + Duration::from_secs(1),
            wall: now.wall + chrono::Duration::hours(5),
        };
        assert!(matches!(
            dispatch_one(&mut state, &TestResolver, MIN_INTERVAL, skewed),
            DispatchOutcome::Throttled { .. }
        ));
    }
}
