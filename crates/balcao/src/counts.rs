// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao counts` command implementation.
//!
//! Prints the per-category unread tallies the inbox tabs badge with.

use std::io::IsTerminal;
use std::sync::Arc;

use balcao_core::types::ConversationCounts;
use balcao_core::{Backend, BalcaoError};
use serde::Serialize;

/// JSON shape of the counts report.
#[derive(Serialize)]
struct CountsReport {
    unassigned: u64,
    in_progress: u64,
    mine: u64,
    archived: u64,
    total: u64,
}

impl CountsReport {
    fn from_counts(counts: &ConversationCounts) -> Self {
        Self {
            unassigned: counts.unassigned,
            in_progress: counts.in_progress,
            mine: counts.mine,
            archived: counts.archived,
            total: counts.unassigned + counts.in_progress + counts.mine + counts.archived,
        }
    }
}

/// Run the `balcao counts` command.
///
/// With `--json`, prints the report as JSON. With `--plain`, disables
/// colored output.
pub async fn run_counts(
    backend: Arc<dyn Backend>,
    json: bool,
    plain: bool,
) -> Result<(), BalcaoError> {
    let counts = backend.conversation_counts().await?;
    let report = CountsReport::from_counts(&counts);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_counts(&report, use_color);
    }

    Ok(())
}

/// Print the counts table with optional colors.
fn print_counts(report: &CountsReport, use_color: bool) {
    println!();
    println!("  balcao counts");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!(
            "    {:<14} {}",
            "unassigned",
            report.unassigned.to_string().cyan()
        );
        println!(
            "    {:<14} {}",
            "in-progress",
            report.in_progress.to_string().cyan()
        );
        println!("    {:<14} {}", "mine", report.mine.to_string().cyan());
        println!(
            "    {:<14} {}",
            "archived",
            report.archived.to_string().cyan()
        );
        println!("    {:<14} {}", "total", report.total.to_string().bold());
    } else {
        println!("    {:<14} {}", "unassigned", report.unassigned);
        println!("    {:<14} {}", "in-progress", report.in_progress);
        println!("    {:<14} {}", "mine", report.mine);
        println!("    {:<14} {}", "archived", report.archived);
        println!("    {:<14} {}", "total", report.total);
    }

    println!();
}
