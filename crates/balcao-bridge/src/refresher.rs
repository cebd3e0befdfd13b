// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic channel list refresher.
//!
//! While a channels view is open, the list is re-fetched on a fixed
//! interval so connection status changes show up without user action. Much
//! simpler than the QR watcher: no state machine, just fetch and emit.

use std::sync::Arc;
use std::time::Duration;

use balcao_config::model::BridgeConfig;
use balcao_core::types::Channel;
use balcao_core::Backend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One refresh outcome. Errors are transient; the next tick retries.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Channels(Vec<Channel>),
    RefreshError(String),
}

/// Handle to the running refresher. Dropping it stops the timer.
pub struct ChannelRefresher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ChannelRefresher {
    /// Starts refreshing. The first fetch happens immediately, then on
    /// every interval tick.
    pub fn start(
        backend: Arc<dyn Backend>,
        config: &BridgeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RefreshEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let interval = Duration::from_secs(config.refresh_interval_secs);

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                match backend.list_channels().await {
                    Ok(channels) => {
                        if tx.send(RefreshEvent::Channels(channels)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "channel refresh failed");
                        if tx.send(RefreshEvent::RefreshError(e.to_string())).is_err() {
                            return;
                        }
                    }
                }
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!("channel refresher stopped");
                        return;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        (Self { cancel, handle }, rx)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops refreshing.
    pub fn stop(self) {
        self.cancel.cancel();
    }
}

impl Drop for ChannelRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
