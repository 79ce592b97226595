// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `askq status` command implementation.
//!
//! Loads the shared queue without running the dispatcher and prints its
//! statistics, load level and the head of the pending queue. `--json`
//! emits the same data for scripting; colors are dropped when stdout is
//! not a TTY.

use std::io::IsTerminal;

use askq_config::model::AskqConfig;
use askq_core::AskqError;
use askq_queue::{Health, HealthLevel, QueueHandle, QueuePreview, Stats};
use colored::Colorize;
use serde::Serialize;

use crate::runtime::{Dispatch, Runtime};

/// Pending requests listed by `status`.
const PREVIEW_LIMIT: usize = 5;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub stats: Stats,
    pub health: Health,
    pub uptime_human: String,
    pub queue: QueuePreview,
}

impl StatusReport {
    pub async fn collect(handle: &QueueHandle) -> Result<Self, AskqError> {
        let stats = handle.stats().await?;
        let health = handle.health().await?;
        let queue = handle.preview(PREVIEW_LIMIT).await?;
        Ok(Self {
            uptime_human: format_uptime(stats.uptime_seconds),
            stats,
            health,
            queue,
        })
    }
}

/// Format seconds into a human-readable duration string.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{secs}s")
    }
}

/// Run the `askq status` command.
pub async fn run_status(config: &AskqConfig, json: bool) -> Result<(), AskqError> {
    let runtime = Runtime::start(config, Dispatch::Off).await?;
    let report = StatusReport::collect(&runtime.handle).await;
    runtime.stop().await;
    let report = report?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| AskqError::Serialization(e.to_string()))?;
        println!("{out}");
    } else {
        let use_color = std::io::stdout().is_terminal();
        print!("{}", render_report(&report, use_color));
    }
    Ok(())
}

/// Colored label for a load level.
pub fn health_badge(level: HealthLevel, use_color: bool) -> String {
    let label = level.to_string();
    if !use_color {
        return format!("[{label}]");
    }
    match level {
        HealthLevel::Excellent | HealthLevel::Good => label.green().to_string(),
        HealthLevel::Moderate => label.yellow().to_string(),
        HealthLevel::Heavy => label.red().to_string(),
    }
}

fn render_report(report: &StatusReport, use_color: bool) -> String {
    let stats = &report.stats;
    let mut out = String::new();
    out.push('\n');
    out.push_str("  askq status\n");
    out.push_str(&format!("  {}\n", "-".repeat(35)));
    out.push_str(&format!(
        "    Load:       {} {}\n",
        health_badge(report.health.level, use_color),
        report.health.message
    ));
    out.push_str(&format!("    Pending:    {}\n", stats.pending_count));
    out.push_str(&format!("    In flight:  {}\n", stats.in_flight_count));
    out.push_str(&format!("    Unread:     {}\n", stats.outbox_count));
    out.push_str(&format!("    Processed:  {}\n", stats.total_processed));
    out.push_str(&format!("    Active:     {}\n", stats.active_count));
    out.push_str(&format!("    Avg time:   {:.1}s\n", stats.avg_processing_time));
    out.push_str(&format!("    Uptime:     {}\n", report.uptime_human));

    if !report.queue.entries.is_empty() {
        out.push('\n');
        out.push_str(&render_preview(&report.queue));
    }
    out.push('\n');
    out
}

/// One line per pending request, followed by a "+N more" line.
pub fn render_preview(preview: &QueuePreview) -> String {
    let mut out = String::new();
    for entry in &preview.entries {
        out.push_str(&format!(
            "    {}. [{}] {}\n",
            entry.position, entry.client_tag, entry.preview
        ));
    }
    if preview.remaining > 0 {
        out.push_str(&format!("    +{} more\n", preview.remaining));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use askq_queue::PreviewEntry;

    fn report() -> StatusReport {
        StatusReport {
            stats: Stats {
                pending_count: 6,
                in_flight_count: 0,
                outbox_count: 1,
                total_processed: 4,
                active_count: 2,
                avg_processing_time: 30.0,
                uptime_seconds: 120,
            },
            health: Health {
                level: HealthLevel::Moderate,
                message: "6 requests waiting".to_string(),
            },
            uptime_human: format_uptime(120),
            queue: QueuePreview {
                entries: vec![PreviewEntry {
                    position: 1,
                    client_tag: "1234".to_string(),
                    preview: "How do I enroll?".to_string(),
                }],
                remaining: 5,
            },
        }
    }

    #[test]
    fn format_uptime_seconds() {
        assert_eq!(format_uptime(42), "42s");
    }

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn plain_report_lists_counts_and_preview() {
        let text = render_report(&report(), false);
        assert!(text.contains("[Moderate] 6 requests waiting"));
        assert!(text.contains("Pending:    6"));
        assert!(text.contains("1. [1234] How do I enroll?"));
        assert!(text.contains("+5 more"));
    }

    #[test]
    fn report_serializes_with_snake_case_level() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["stats"]["pending_count"], 6);
        assert_eq!(json["health"]["level"], "moderate");
        assert_eq!(json["queue"]["remaining"], 5);
        assert_eq!(json["uptime_human"], "2m");
    }
}
