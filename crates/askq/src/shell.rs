// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `askq shell` command implementation.
//!
//! Launches an interactive REPL with colored prompt and readline history.
//! Plain lines are submitted to the shared queue and the shell waits for the
//! answer; slash commands inspect the queue or submit a category shortcut.

use askq_config::model::AskqConfig;
use askq_core::{AskqError, ClientId, Response};
use askq_queue::{ClientSession, SubmitOutcome};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::runtime::{Dispatch, Runtime};
use crate::status::{health_badge, render_preview};

/// Pending requests listed by `/queue`.
const QUEUE_LIMIT: usize = 10;

const HELP: &str = "\
  /help               show this list
  /categories         list quick-submit categories
  /quick <category>   submit a category shortcut
  /status             queue statistics and load
  /history            your previous questions and answers
  /queue              pending requests
  /quit               leave the shell";

/// One parsed line of shell input.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Ask(&'a str),
    Quick(&'a str),
    Categories,
    Status,
    History,
    Queue,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

impl<'a> ShellCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Ask(line);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "quick" | "q" if !arg.is_empty() => Self::Quick(arg),
            "categories" | "cats" => Self::Categories,
            "status" => Self::Status,
            "history" => Self::History,
            "queue" => Self::Queue,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line),
        }
    }
}

/// Runs the `askq shell` interactive REPL.
pub async fn run_shell(config: &AskqConfig, client: Option<String>) -> Result<(), AskqError> {
    let runtime = Runtime::start(config, Dispatch::Auto).await?;
    let session = ClientSession::new(
        runtime.handle.clone(),
        client.map(ClientId::from),
        &config.client,
    );

    let result = repl(config, &runtime, &session).await;
    runtime.stop().await;
    result
}

async fn repl(
    config: &AskqConfig,
    runtime: &Runtime,
    session: &ClientSession,
) -> Result<(), AskqError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| AskqError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!("You are {}.", session.id().as_str().cyan());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let prompt = format!("{}> ", session.id().as_str().green());
    loop {
        if runtime.is_cancelled() {
            break;
        }
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        let command = ShellCommand::parse(&line);
        if command == ShellCommand::Quit {
            break;
        }
        if command != ShellCommand::Empty {
            let _ = rl.add_history_entry(line.as_str());
        }

        if let Err(e) = handle_command(config, session, command).await {
            if matches!(e, AskqError::ServiceClosed) {
                eprintln!("{}", "queue service stopped".red());
                break;
            }
            eprintln!("{}: {e}", "error".red());
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn handle_command(
    config: &AskqConfig,
    session: &ClientSession,
    command: ShellCommand<'_>,
) -> Result<(), AskqError> {
    let handle = session.handle();
    match command {
        ShellCommand::Empty | ShellCommand::Quit => {}
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Unknown(line) => {
            println!("unknown command {}; try {}", line.yellow(), "/help".yellow());
        }
        ShellCommand::Ask(text) => {
            let applied = session.ask(text).await?;
            if let Some(err) = &applied.flush_error {
                warn!(error = %err, "request accepted but not persisted");
            }
            await_answer(config, session, applied.value).await?;
        }
        ShellCommand::Quick(category) => {
            let applied = session.quick_ask(category).await?;
            await_answer(config, session, applied.value).await?;
        }
        ShellCommand::Categories => {
            for category in handle.categories().await? {
                println!("  {:<20} {}", category.name.bold(), category.keyword.dimmed());
            }
        }
        ShellCommand::Status => {
            let stats = handle.stats().await?;
            let health = handle.health().await?;
            println!(
                "  {} {}  |  processed {}  |  active {}",
                health_badge(health.level, true),
                health.message,
                stats.total_processed,
                stats.active_count
            );
        }
        ShellCommand::History => {
            let history = session.history().await?;
            if history.is_empty() {
                println!("{}", "no previous questions".dimmed());
            }
            for entry in history {
                println!("  {} {} {}", entry.clock_time().dimmed(), "you:".cyan(), entry.user);
                println!("  {} {} {}", entry.clock_time().dimmed(), "bot:".green(), entry.bot);
            }
        }
        ShellCommand::Queue => {
            let preview = handle.preview(QUEUE_LIMIT).await?;
            if preview.entries.is_empty() {
                println!("{}", "queue is empty".dimmed());
            } else {
                print!("{}", render_preview(&preview));
            }
        }
    }
    Ok(())
}

async fn await_answer(
    config: &AskqConfig,
    session: &ClientSession,
    outcome: SubmitOutcome,
) -> Result<(), AskqError> {
    let SubmitOutcome::Enqueued { id, position } = outcome else {
        return Ok(());
    };
    println!(
        "{}",
        format!("request #{id} queued at position {position}").dimmed()
    );

    match session.wait_for_response(config.client.max_wait()).await? {
        Some(response) => print_response(&config.agent.name, &response),
        None => {
            debug!(request_id = id, "no response within the wait limit");
            println!(
                "{}",
                "still waiting; your answer will be shown on the next question".yellow()
            );
        }
    }
    Ok(())
}

fn print_response(agent_name: &str, response: &Response) {
    println!("{} {}", format!("{agent_name}:").green().bold(), response.text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            ShellCommand::parse("  How do I enroll?  "),
            ShellCommand::Ask("How do I enroll?")
        );
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
    }

    #[test]
    fn quick_takes_the_rest_of_the_line() {
        assert_eq!(
            ShellCommand::parse("/quick Fee Payment"),
            ShellCommand::Quick("Fee Payment")
        );
        assert_eq!(ShellCommand::parse("/q grades"), ShellCommand::Quick("grades"));
    }

    #[test]
    fn quick_without_category_is_unknown() {
        assert_eq!(ShellCommand::parse("/quick"), ShellCommand::Unknown("/quick"));
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(ShellCommand::parse("/categories"), ShellCommand::Categories);
        assert_eq!(ShellCommand::parse("/status"), ShellCommand::Status);
        assert_eq!(ShellCommand::parse("/history"), ShellCommand::History);
        assert_eq!(ShellCommand::parse("/queue"), ShellCommand::Queue);
        assert_eq!(ShellCommand::parse("/help"), ShellCommand::Help);
        assert_eq!(ShellCommand::parse("/exit"), ShellCommand::Quit);
        assert_eq!(ShellCommand::parse("/dance"), ShellCommand::Unknown("/dance"));
    }
}
