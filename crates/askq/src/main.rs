// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! askq - a shared help-desk request queue.
//!
//! This is the binary entry point. Every subcommand loads the persisted queue,
//! runs one queue service for the life of the process and flushes it on exit.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod runtime;
mod shell;
mod simulate;
mod status;

use std::path::PathBuf;

use askq_config::model::AskqConfig;
use clap::{Parser, Subcommand};

/// askq - a shared help-desk request queue.
#[derive(Parser, Debug)]
#[command(name = "askq", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive session against the shared queue.
    Shell {
        /// Client id to use (default: a generated Student_NNNN).
        #[arg(long)]
        client: Option<String>,
    },
    /// Submit one question and wait for the answer.
    Ask {
        /// The question text.
        text: String,
        /// Client id to use (default: a generated Student_NNNN).
        #[arg(long)]
        client: Option<String>,
        /// Seconds to wait for the answer (default: client.max_wait_secs).
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
    },
    /// Show queue statistics and load.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List quick-submit categories.
    Categories,
    /// Run concurrent client sessions against one queue.
    Simulate {
        /// Number of concurrent clients.
        #[arg(long, default_value_t = 5)]
        clients: usize,
        /// Requests submitted by each client.
        #[arg(long, default_value_t = 2)]
        requests: usize,
        /// Override queue.min_dispatch_interval_ms for this run.
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// Clear pending, in-flight and undelivered requests.
    Reset {
        /// Also forget counters and transcript, and delete the stored snapshot.
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => askq_config::load_and_validate_path(path),
        None => askq_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            askq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, config: &AskqConfig) -> Result<(), askq_core::AskqError> {
    match command {
        Some(Commands::Shell { client }) => shell::run_shell(config, client).await,
        Some(Commands::Ask { text, client, wait }) => {
            commands::run_ask(config, &text, client, wait).await
        }
        Some(Commands::Status { json }) => status::run_status(config, json).await,
        Some(Commands::Categories) => commands::run_categories(config).await,
        Some(Commands::Simulate {
            clients,
            requests,
            interval_ms,
        }) => simulate::run_simulate(config, clients, requests, interval_ms).await,
        Some(Commands::Reset { all }) => commands::run_reset(config, all).await,
        None => {
            println!("askq: use --help for available commands");
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("askq={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
