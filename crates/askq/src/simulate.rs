// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `askq simulate` command implementation.
//!
//! Runs several client sessions concurrently against one queue service and
//! reports the ids each was handed. Distinct, gap-free ids and a matching
//! processed count show that no submission was lost.

use std::collections::BTreeSet;
use std::time::Duration;

use askq_config::model::AskqConfig;
use askq_core::{AskqError, ClientId, RequestId};
use askq_queue::{ClientSession, QueueHandle, Stats, SubmitOutcome};
use tracing::debug;

use crate::runtime::{Dispatch, Runtime};

const SAMPLE_QUESTIONS: &[&str] = &[
    "How do I enroll for next term?",
    "Where can I pay tuition?",
    "When are grades released?",
    "What is my class schedule?",
    "How much is the id replacement fee?",
    "Can I request a transcript?",
    "Is there a scholarship this year?",
    "Who do I ask about this?",
];

/// What one simulated client saw.
#[derive(Debug, Clone)]
pub struct ClientRun {
    pub client_id: ClientId,
    pub request_ids: Vec<RequestId>,
    pub answered: usize,
}

/// Outcome of a whole simulation.
#[derive(Debug)]
pub struct SimulationReport {
    pub runs: Vec<ClientRun>,
    pub stats: Stats,
}

impl SimulationReport {
    pub fn submitted(&self) -> usize {
        self.runs.iter().map(|r| r.request_ids.len()).sum()
    }

    pub fn answered(&self) -> usize {
        self.runs.iter().map(|r| r.answered).sum()
    }

    /// True when every submission got its own id.
    pub fn ids_are_distinct(&self) -> bool {
        let ids: BTreeSet<RequestId> = self
            .runs
            .iter()
            .flat_map(|r| r.request_ids.iter().copied())
            .collect();
        ids.len() == self.submitted()
    }
}

/// Run the `askq simulate` command.
pub async fn run_simulate(
    config: &AskqConfig,
    clients: usize,
    requests: usize,
    interval_ms: Option<u64>,
) -> Result<(), AskqError> {
    let mut config = config.clone();
    if let Some(ms) = interval_ms {
        config.queue.min_dispatch_interval_ms = ms;
    }
    let runtime = Runtime::start(&config, Dispatch::Auto).await?;
    let report = simulate(&runtime.handle, &config, clients, requests).await;
    runtime.stop().await;
    let report = report?;

    for run in &report.runs {
        println!(
            "{:<14} ids {:?}  answered {}/{}",
            run.client_id.as_str(),
            run.request_ids,
            run.answered,
            run.request_ids.len()
        );
    }
    println!();
    println!(
        "submitted {}  answered {}  distinct ids {}  processed total {}",
        report.submitted(),
        report.answered(),
        if report.ids_are_distinct() { "yes" } else { "NO" },
        report.stats.total_processed
    );
    Ok(())
}

/// Drives `clients` sessions that each submit `requests` questions, then
/// waits for their answers.
pub async fn simulate(
    handle: &QueueHandle,
    config: &AskqConfig,
    clients: usize,
    requests: usize,
) -> Result<SimulationReport, AskqError> {
    // Room for every answer plus slack for the dispatcher tick.
    let max_wait = config.queue.min_dispatch_interval() * (clients * requests + 1) as u32
        + config.client.max_wait();

    let runs = (0..clients).map(|n| {
        let session = ClientSession::new(
            handle.clone(),
            Some(ClientId(format!("Student_{:04}", 1000 + n))),
            &config.client,
        );
        async move { run_client(session, n, requests, max_wait).await }
    });
    let runs = futures::future::try_join_all(runs).await?;

    let stats = handle.stats().await?;
    Ok(SimulationReport { runs, stats })
}

async fn run_client(
    session: ClientSession,
    n: usize,
    requests: usize,
    max_wait: Duration,
) -> Result<ClientRun, AskqError> {
    let mut request_ids = Vec::with_capacity(requests);
    for i in 0..requests {
        let question = SAMPLE_QUESTIONS[(n + i) % SAMPLE_QUESTIONS.len()];
        if let SubmitOutcome::Enqueued { id, .. } = session.ask(question).await?.value {
            request_ids.push(id);
        }
    }

    let mut answered = 0;
    while answered < request_ids.len() {
        match session.wait_for_response(max_wait).await? {
            Some(response) => {
                debug!(client_id = %session.id(), request_id = response.id, "answer received");
                answered += 1;
            }
            None => break,
        }
    }

    Ok(ClientRun {
        client_id: session.id().clone(),
        request_ids,
        answered,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use askq_core::{Snapshot, SnapshotStore};
    use askq_queue::QueueService;
    use askq_resolver::{builtin_catalog, SubstringResolver};
    use tokio_util::sync::CancellationToken;

    struct NullStore;

    #[async_trait::async_trait]
    impl SnapshotStore for NullStore {
        fn name(&self) -> &str {
            "null"
        }

        async fn load(&self) -> Option<Snapshot> {
            None
        }

        async fn save(&self, _snapshot: &Snapshot) -> Result<(), AskqError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), AskqError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_clients_lose_nothing() {
        let config = AskqConfig::default();
        let service = QueueService::load(
            config.queue.clone(),
            Arc::new(NullStore),
            Arc::new(SubstringResolver::new(builtin_catalog())),
        )
        .await;
        let (handle, _task) = service.spawn(CancellationToken::new());

        let report = simulate(&handle, &config, 4, 3).await.unwrap();

        assert_eq!(report.submitted(), 12);
        assert!(report.ids_are_distinct());
        assert_eq!(report.answered(), 12);
        assert_eq!(report.stats.total_processed, 12);
        assert_eq!(report.stats.pending_count, 0);
    }

    #[test]
    fn duplicate_ids_are_detected() {
        let run = ClientRun {
            client_id: ClientId::from("Student_1000"),
            request_ids: vec![1, 2],
            answered: 2,
        };
        let report = SimulationReport {
            runs: vec![run.clone(), run],
            stats: Stats {
                pending_count: 0,
                in_flight_count: 0,
                outbox_count: 0,
                total_processed: 4,
                active_count: 1,
                avg_processing_time: 0.0,
                uptime_seconds: 0,
            },
        };
        assert_eq!(report.submitted(), 4);
        assert!(!report.ids_are_distinct());
    }
}
