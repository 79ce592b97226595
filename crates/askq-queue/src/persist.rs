// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading and saving [`QueueState`] through a [`SnapshotStore`].

use askq_config::model::QueueConfig;
use askq_core::{AskqError, SnapshotStore};
use tracing::{debug, info};

use crate::manager::{clean_inactive, recover_in_flight};
use crate::state::{Now, QueueState};

/// Loads the persisted state, or a fresh one when there is none.
///
/// Requests interrupted mid-dispatch are requeued and stale clients are
/// swept before the state is handed out.
pub async fn load_state(store: &dyn SnapshotStore, config: &QueueConfig, now: Now) -> QueueState {
    let Some(snapshot) = store.load().await else {
        info!(store = store.name(), "no snapshot found, starting with an empty queue");
        return QueueState::new(now.wall).with_caps(config.transcript_cap, config.event_log_cap);
    };

    let (state, dropped) = QueueState::from_snapshot(snapshot, now);
    let mut state = state.with_caps(config.transcript_cap, config.event_log_cap);
    let recovered = recover_in_flight(&mut state);
    let swept = clean_inactive(&mut state, config.inactivity_timeout(), now);

    info!(
        store = store.name(),
        pending = state.pending.len(),
        outbox = state.outbox.len(),
        total_submitted = state.total_submitted,
        recovered,
        swept = swept + dropped,
        "queue state loaded"
    );
    state
}

/// Writes the full state; transcript and event log are truncated to their caps.
pub async fn save_state(
    store: &dyn SnapshotStore,
    state: &QueueState,
    now: Now,
) -> Result<(), AskqError> {
    let snapshot = state.to_snapshot(now);
    store.save(&snapshot).await?;
    debug!(
        store = store.name(),
        pending = snapshot.pending.len(),
        "queue state saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askq_core::{ClientId, Snapshot, TranscriptEntry};
    use askq_storage::JsonFileStore;

    fn entry(n: usize, now: Now) -> TranscriptEntry {
        TranscriptEntry {
            user: format!("q{n}"),
            bot: format!("a{n}"),
            time: now.wall,
            client_id: ClientId::from("Student_0001"),
        }
    }

    #[tokio::test]
    async fn missing_snapshot_yields_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("q.json")).unwrap();
        let now = Now::capture();

        let state = load_state(&store, &QueueConfig::default(), now).await;
        assert!(state.pending.is_empty());
        assert_eq!(state.total_submitted, 0);
        assert_eq!(state.started_at, now.wall);
    }

    #[tokio::test]
    async fn transcript_of_150_reloads_as_last_100_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("q.json")).unwrap();
        let now = Now::capture();

        let mut state = QueueState::new(now.wall);
        state.transcript = (0..150).map(|n| entry(n, now)).collect();
        save_state(&store, &state, now).await.unwrap();

        let loaded = load_state(&store, &QueueConfig::default(), now).await;
        assert_eq!(loaded.transcript.len(), 100);
        assert_eq!(loaded.transcript[0].user, "q50");
        assert_eq!(loaded.transcript[99].user, "q149");
    }

    #[tokio::test]
    async fn load_sweeps_stale_clients_and_recovers_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("q.json")).unwrap();
        let now = Now::capture();

        let mut snapshot = Snapshot::empty(now.wall);
        snapshot.activity.insert(
            "Student_0001".into(),
            (now.wall - chrono::Duration::seconds(5)).to_rfc3339(),
        );
        snapshot.activity.insert(
            "Student_0002".into(),
            (now.wall - chrono::Duration::seconds(120)).to_rfc3339(),
        );
        snapshot.in_flight.push(askq_core::Request {
            id: 1,
            text: "enroll".into(),
            submitted_at: now.wall,
            client_id: ClientId::from("Student_0001"),
        });
        snapshot.total_submitted = 1;
        store.save(&snapshot).await.unwrap();

        let config = QueueConfig {
            inactivity_timeout_secs: 30,
            ..QueueConfig::default()
        };
        let state = load_state(&store, &config, now).await;
        assert_eq!(state.activity.len(), 1);
        assert!(state.in_flight.is_empty());
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.pending[0].id, 1);
    }

    #[tokio::test]
    async fn configured_caps_apply_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("q.json")).unwrap();
        let now = Now::capture();

        let mut state = QueueState::new(now.wall);
        state.transcript = (0..20).map(|n| entry(n, now)).collect();
        let state = state.with_caps(5, 5);
        save_state(&store, &state, now).await.unwrap();

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.transcript.len(), 5);
        assert_eq!(snapshot.transcript[4].user, "q19");
    }
}
