// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao channels` command implementation.
//!
//! Lists the tenant's WhatsApp channels with their bridge status. With
//! `--watch`, keeps re-listing on the configured interval until Ctrl+C.

use std::io::IsTerminal;
use std::sync::Arc;

use balcao_bridge::{ChannelRefresher, RefreshEvent};
use balcao_config::model::BridgeConfig;
use balcao_core::types::{Channel, ChannelStatus};
use balcao_core::{Backend, BalcaoError};

/// Run the `balcao channels` command.
pub async fn run_channels(
    backend: Arc<dyn Backend>,
    bridge: &BridgeConfig,
    json: bool,
    plain: bool,
    watch: bool,
) -> Result<(), BalcaoError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    if watch {
        // The refresher fetches immediately, so the first print is not
        // delayed by one interval.
        let (refresher, mut events) = ChannelRefresher::start(backend, bridge);
        println!("watching channels; press Ctrl+C to stop");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Some(RefreshEvent::Channels(channels)) => {
                        print_channels(&channels, use_color);
                    }
                    Some(RefreshEvent::RefreshError(e)) => {
                        eprintln!("refresh failed: {e}");
                    }
                    None => break,
                },
            }
        }
        refresher.stop();
        return Ok(());
    }

    let channels = backend.list_channels().await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&channels).unwrap_or_else(|_| "[]".to_string())
        );
    } else {
        print_channels(&channels, use_color);
    }

    Ok(())
}

fn print_channels(channels: &[Channel], use_color: bool) {
    println!();
    if channels.is_empty() {
        println!("  no channels configured");
        println!();
        return;
    }

    println!("  {} channel(s)", channels.len());
    println!("  {}", "-".repeat(50));
    for channel in channels {
        println!("{}", render_channel(channel, use_color));
    }
    println!();
}

/// One list row: status badge, name, connection state, session hint.
fn render_channel(channel: &Channel, use_color: bool) -> String {
    let badge = if use_color {
        use colored::Colorize;
        match channel.status {
            ChannelStatus::Connected => "✓".green().to_string(),
            ChannelStatus::Connecting => "~".yellow().to_string(),
            ChannelStatus::Disconnected => "✗".red().to_string(),
        }
    } else {
        match channel.status {
            ChannelStatus::Connected => "[OK]".to_string(),
            ChannelStatus::Connecting => "[..]".to_string(),
            ChannelStatus::Disconnected => "[--]".to_string(),
        }
    };

    let hint = if channel.has_session() {
        ""
    } else {
        "  no session; pair with `balcao connect`"
    };

    format!(
        "    {badge} {:<24} {:<12}{hint}",
        channel.name, channel.status
    )
}
