// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `ask`, `categories` and `reset`.

use std::time::Duration;

use askq_config::model::AskqConfig;
use askq_core::{AskqError, ClientId};
use askq_queue::{ClientSession, SubmitOutcome};
use tracing::{info, warn};

use crate::runtime::{Dispatch, Runtime};

/// Submits one question and waits for its answer.
///
/// Prints the answer on stdout. When the wait runs out the request stays
/// queued and is answered on a later run by the same client id.
pub async fn run_ask(
    config: &AskqConfig,
    text: &str,
    client: Option<String>,
    wait_secs: Option<u64>,
) -> Result<(), AskqError> {
    let runtime = Runtime::start(config, Dispatch::Auto).await?;
    let session = ClientSession::new(
        runtime.handle.clone(),
        client.map(ClientId::from),
        &config.client,
    );
    let max_wait = wait_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.client.max_wait());

    let result = ask_and_wait(&session, text, max_wait).await;
    runtime.stop().await;

    match result? {
        Asked::Answered(answer) => println!("{answer}"),
        Asked::Pending => eprintln!(
            "no answer within {}s; ask again as {} to collect it",
            max_wait.as_secs(),
            session.id()
        ),
        Asked::Ignored => eprintln!("empty question ignored; nothing was queued"),
    }
    Ok(())
}

/// How a single `ask` ended.
#[derive(Debug, PartialEq)]
enum Asked {
    Answered(String),
    /// Queued, but not answered within the wait.
    Pending,
    /// Blank text; the queue was not touched.
    Ignored,
}

async fn ask_and_wait(
    session: &ClientSession,
    text: &str,
    max_wait: Duration,
) -> Result<Asked, AskqError> {
    let applied = session.ask(text).await?;
    if let Some(err) = &applied.flush_error {
        warn!(error = %err, "request accepted but not persisted");
    }
    match applied.value {
        SubmitOutcome::Enqueued { id, position } => {
            info!(request_id = id, position, client_id = %session.id(), "request queued");
        }
        SubmitOutcome::Ignored => return Ok(Asked::Ignored),
    }
    Ok(match session.wait_for_response(max_wait).await? {
        Some(response) => Asked::Answered(response.text),
        None => Asked::Pending,
    })
}

/// Lists the quick-submit categories and their keywords.
pub async fn run_categories(config: &AskqConfig) -> Result<(), AskqError> {
    let runtime = Runtime::start(config, Dispatch::Off).await?;
    let categories = runtime.handle.categories().await;
    runtime.stop().await;

    for category in categories? {
        println!("{:<20} {}", category.name, category.keyword);
    }
    Ok(())
}

/// Clears pending, in-flight and undelivered requests. With `all`, the
/// whole state goes and the stored snapshot is deleted.
pub async fn run_reset(config: &AskqConfig, all: bool) -> Result<(), AskqError> {
    let runtime = Runtime::start(config, Dispatch::Off).await?;
    let before = runtime.handle.stats().await;
    let cleared = if all {
        runtime.handle.purge().await
    } else {
        runtime.handle.reset().await.and_then(|applied| match applied.flush_error {
            Some(err) => Err(AskqError::Internal(format!("queue cleared but not saved: {err}"))),
            None => Ok(()),
        })
    };
    runtime.stop().await;

    let before = before?;
    cleared?;
    println!(
        "cleared {} pending and {} undelivered request(s)",
        before.pending_count + before.in_flight_count,
        before.outbox_count
    );
    if all {
        println!("forgot {} processed request(s) and removed the snapshot", before.total_processed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use askq_queue::QueueService;
    use askq_resolver::{builtin_catalog, SubstringResolver};
    use askq_storage::JsonFileStore;
    use tokio_util::sync::CancellationToken;

    async fn session(dir: &tempfile::TempDir) -> ClientSession {
        let config = AskqConfig::default();
        let store = JsonFileStore::open(dir.path().join("shared_queue.json")).unwrap();
        let service = QueueService::load(
            config.queue.clone(),
            Arc::new(store),
            Arc::new(SubstringResolver::new(builtin_catalog())),
        )
        .await;
        let (handle, _task) = service.spawn(CancellationToken::new());
        ClientSession::new(handle, Some(ClientId::from("Student_4242")), &config.client)
    }

    #[tokio::test(start_paused = true)]
    async fn blank_question_is_ignored_not_pending() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir).await;

        let asked = ask_and_wait(&session, "   ", Duration::from_secs(5)).await.unwrap();
        assert_eq!(asked, Asked::Ignored);
        assert_eq!(session.handle().stats().await.unwrap().pending_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn question_is_answered_by_the_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir).await;

        let asked = ask_and_wait(&session, "How do I enroll?", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(matches!(asked, Asked::Answered(text) if text.contains("Registration tab")));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_question_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir).await;
        session.handle().submit("first in line", &ClientId::from("Student_0001")).await.unwrap();
        session.handle().submit("second in line", &ClientId::from("Student_0002")).await.unwrap();

        // Default interval is 3s; two requests ahead means no answer within 1s.
        let asked = ask_and_wait(&session, "grades", Duration::from_secs(1)).await.unwrap();
        assert_eq!(asked, Asked::Pending);
    }
}
