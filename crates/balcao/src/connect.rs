// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao connect` command implementation.
//!
//! Pairs a channel with WhatsApp: writes each QR code to a temp file for
//! the operator to scan, follows the bridge status while the pairing is
//! open, and stops on its own shortly after the session connects.

use std::path::PathBuf;
use std::sync::Arc;

use balcao_bridge::{QrWatcher, WatcherEvent};
use balcao_config::model::BridgeConfig;
use balcao_core::types::{Channel, ChannelStatus};
use balcao_core::{Backend, BalcaoError};
use colored::Colorize;
use tokio::io::AsyncBufReadExt;

/// Run the `balcao connect` command. `channel_ref` is a channel name or id.
pub async fn run_connect(
    backend: Arc<dyn Backend>,
    bridge: &BridgeConfig,
    channel_ref: &str,
) -> Result<(), BalcaoError> {
    let channels = backend.list_channels().await?;
    let target = find_channel(&channels, channel_ref)?.clone();
    drop(channels);

    if target.status == ChannelStatus::Connected {
        println!("channel {} is already connected", target.name);
        return Ok(());
    }

    let qr_file = qr_path(&target.name);
    println!(
        "pairing {}; scan the QR code with WhatsApp",
        target.name.bold()
    );
    println!("press Enter for a fresh code, q then Enter to stop");

    let (watcher, mut events) = QrWatcher::open(backend.clone(), target.id, bridge);
    let mut input = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(WatcherEvent::Qr(png)) => match std::fs::write(&qr_file, &png) {
                    Ok(()) => println!("QR code written to {}", qr_file.display()),
                    Err(e) => eprintln!("cannot write QR code: {e}"),
                },
                Some(WatcherEvent::Status { session, .. }) => {
                    println!("bridge: {session}");
                }
                Some(WatcherEvent::Connected) => {
                    println!("{} channel connected", "✓".green());
                }
                Some(WatcherEvent::RefreshChannels) => {
                    if let Ok(refreshed) = backend.list_channels().await
                        && let Some(channel) = refreshed.iter().find(|c| c.id == target.id)
                    {
                        println!("channel {} is now {}", channel.name, channel.status);
                    }
                }
                Some(WatcherEvent::PollError(e)) => {
                    eprintln!("poll: {e}");
                }
                Some(WatcherEvent::Closed) | None => break,
            },
            line = input.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim() == "q" => break,
                Ok(Some(_)) => watcher.regenerate_qr(),
                // Closed stdin; keep following bridge events.
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    drop(watcher);
    let _ = std::fs::remove_file(&qr_file);
    Ok(())
}

/// Resolves a channel by id or (case-insensitive) name.
fn find_channel<'a>(channels: &'a [Channel], wanted: &str) -> Result<&'a Channel, BalcaoError> {
    if channels.is_empty() {
        return Err(BalcaoError::Validation(
            "no channels configured for this tenant".to_string(),
        ));
    }

    if let Some(channel) = channels
        .iter()
        .find(|c| c.id.to_string() == wanted || c.name.eq_ignore_ascii_case(wanted))
    {
        return Ok(channel);
    }

    let wanted_lower = wanted.to_lowercase();
    let suggestion = channels
        .iter()
        .map(|c| (strsim::jaro_winkler(&c.name.to_lowercase(), &wanted_lower), c))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.name.clone());

    Err(match suggestion {
        Some(name) => BalcaoError::Validation(format!(
            "channel `{wanted}` not found; did you mean `{name}`?"
        )),
        None => {
            let known: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
            BalcaoError::Validation(format!(
                "channel `{wanted}` not found; known channels: {}",
                known.join(", ")
            ))
        }
    })
}

/// Where the QR image lands: `<tmp>/balcao-qr-<channel>.png`.
fn qr_path(channel_name: &str) -> PathBuf {
    let slug: String = channel_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    std::env::temp_dir().join(format!("balcao-qr-{slug}.png"))
}
