// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao import` command implementation.
//!
//! Uploads a product CSV, then follows the job with a progress bar until
//! the server reports a terminal status. The job keeps running server-side
//! if the command is interrupted.

use std::path::Path;
use std::sync::Arc;

use balcao_config::model::ImportConfig;
use balcao_core::types::{ImportJob, ImportStatus};
use balcao_core::{Backend, BalcaoError};
use balcao_import::{ImportEvent, ImportWatcher};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Run the `balcao import` command.
pub async fn run_import(
    backend: Arc<dyn Backend>,
    config: &ImportConfig,
    file: &Path,
    json: bool,
) -> Result<(), BalcaoError> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| BalcaoError::Validation(format!("cannot read {}: {e}", file.display())))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BalcaoError::Validation(format!("{} has no file name", file.display()))
        })?;

    println!("uploading {filename} ({} bytes)", bytes.len());
    let job_id = backend.create_import(&filename, bytes).await?;

    let (watcher, mut events) = ImportWatcher::watch(backend, job_id, config);
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut outcome: Option<ImportJob> = None;
    while let Some(event) = events.recv().await {
        match event {
            ImportEvent::Progress(job) => {
                if job.total_records > 0 {
                    bar.set_length(job.total_records);
                    bar.set_position(job.processed_records);
                }
                bar.set_message(job.status.to_string());
            }
            ImportEvent::Finished(job) => {
                bar.finish_and_clear();
                outcome = Some(job);
                break;
            }
            ImportEvent::PollError(e) => {
                bar.println(format!("poll: {e}"));
            }
        }
    }
    drop(watcher);

    let job = outcome.ok_or_else(|| {
        BalcaoError::Internal("import watcher ended before the job finished".to_string())
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&job).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_report(&job);
    }
    Ok(())
}

fn print_report(job: &ImportJob) {
    let status = match job.status {
        ImportStatus::Completed => job.status.to_string().green(),
        ImportStatus::Failed => job.status.to_string().red(),
        _ => job.status.to_string().normal(),
    };

    println!();
    println!("  import {status}");
    println!("  {}", "-".repeat(35));
    println!(
        "    processed  {}/{}",
        job.processed_records, job.total_records
    );
    println!("    imported   {}", job.success_records);
    println!("    failed     {}", job.error_records);
    if let Some(error) = &job.error_message {
        println!();
        println!("  {error}");
    }
    println!();
}
