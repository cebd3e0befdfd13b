// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background watcher for one QR pairing flow.
//!
//! [`QrWatcher::open`] fetches the pairing QR code, then polls the bridge
//! session status while the flow sits in `connecting`. Observations stream
//! to the consumer as [`WatcherEvent`]s. The first WORKING status completes
//! the flow: one `Connected` event, a deferred `RefreshChannels` request so
//! channel badges catch up, and a `Closed` event once the success notice
//! has had its moment. Poll failures are reported inline and never stop the
//! loop; only [`QrWatcher::close`] (or dropping the watcher) does.

use std::sync::Arc;
use std::time::Duration;

use balcao_config::model::BridgeConfig;
use balcao_core::types::{ChannelStatus, SessionState};
use balcao_core::Backend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::ConnectionState;

/// Events emitted by a pairing flow, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum WatcherEvent {
    /// Fresh QR code PNG, on open and on manual regeneration.
    Qr(Vec<u8>),
    /// The polled bridge status changed since the last observation.
    Status {
        session: SessionState,
        channel: ChannelStatus,
    },
    /// The pairing completed. Emitted exactly once per flow.
    Connected,
    /// The consumer should re-fetch the channel list; sent shortly after
    /// `Connected` so the backend has persisted the new channel status.
    RefreshChannels,
    /// The success notice expired; the flow is over and the task has ended.
    Closed,
    /// A status poll or QR fetch failed. Transient; polling continues.
    PollError(String),
}

enum WatcherCommand {
    RegenerateQr,
}

/// Handle to a running pairing flow. Dropping it cancels the background
/// task; no timers outlive the handle.
pub struct QrWatcher {
    channel_id: Uuid,
    cancel: CancellationToken,
    cmd_tx: mpsc::UnboundedSender<WatcherCommand>,
    handle: JoinHandle<()>,
}

impl QrWatcher {
    /// Opens the pairing flow for a channel and starts polling.
    pub fn open(
        backend: Arc<dyn Backend>,
        channel_id: Uuid,
        config: &BridgeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<WatcherEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        info!(channel_id = %channel_id, "opening qr pairing flow");
        let handle = tokio::spawn(run_flow(
            backend,
            channel_id,
            FlowTimings::from_config(config),
            cancel.clone(),
            cmd_rx,
            tx,
        ));

        (
            Self {
                channel_id,
                cancel,
                cmd_tx,
                handle,
            },
            rx,
        )
    }

    pub fn channel_id(&self) -> Uuid {
        self.channel_id
    }

    /// Requests a fresh QR code; codes expire, so flows that sit open need
    /// this. The backend rejects it with a conflict once the session is
    /// WORKING, which comes back as a [`WatcherEvent::PollError`].
    pub fn regenerate_qr(&self) {
        let _ = self.cmd_tx.send(WatcherCommand::RegenerateQr);
    }

    /// Whether the background task is still running.
    pub fn is_open(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Closes the flow and stops polling.
    pub fn close(self) {
        info!(channel_id = %self.channel_id, "closing qr pairing flow");
        self.cancel.cancel();
    }
}

impl Drop for QrWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct FlowTimings {
    poll_interval: Duration,
    refresh_delay: Duration,
    auto_close: Duration,
}

impl FlowTimings {
    fn from_config(config: &BridgeConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            refresh_delay: Duration::from_millis(config.connected_refresh_delay_ms),
            auto_close: Duration::from_secs(config.notice_auto_close_secs),
        }
    }
}

async fn run_flow(
    backend: Arc<dyn Backend>,
    channel_id: Uuid,
    timings: FlowTimings,
    cancel: CancellationToken,
    mut cmd_rx: mpsc::UnboundedReceiver<WatcherCommand>,
    tx: mpsc::UnboundedSender<WatcherEvent>,
) {
    if !fetch_qr(&backend, channel_id, &tx).await {
        return;
    }

    let mut state = ConnectionState::Disconnected.begin();
    let mut last: Option<SessionState> = None;

    while state.should_poll() {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(channel_id = %channel_id, "qr watcher cancelled");
                return;
            }
            Some(cmd) = cmd_rx.recv() => match cmd {
                WatcherCommand::RegenerateQr => {
                    if !fetch_qr(&backend, channel_id, &tx).await {
                        return;
                    }
                }
            },
            _ = tokio::time::sleep(timings.poll_interval) => {
                match backend.session_status(channel_id).await {
                    Ok(snapshot) => {
                        let session = snapshot.status;
                        if last != Some(session) {
                            last = Some(session);
                            debug!(channel_id = %channel_id, session = %session, "bridge status changed");
                            if !emit(&tx, WatcherEvent::Status {
                                session,
                                channel: session.channel_status(),
                            }) {
                                return;
                            }
                        }
                        state = state.observe(session);
                    }
                    Err(e) => {
                        warn!(channel_id = %channel_id, error = %e, "session status poll failed");
                        if !emit(&tx, WatcherEvent::PollError(e.to_string())) {
                            return;
                        }
                    }
                }
            }
        }
    }

    // Pairing complete. One notification, one deferred refresh, then the
    // notice dismisses itself.
    info!(channel_id = %channel_id, "bridge session connected");
    if !emit(&tx, WatcherEvent::Connected) {
        return;
    }

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(timings.refresh_delay) => {
            if !emit(&tx, WatcherEvent::RefreshChannels) {
                return;
            }
        }
    }

    let remaining = timings.auto_close.saturating_sub(timings.refresh_delay);
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(remaining) => {
            let _ = emit(&tx, WatcherEvent::Closed);
        }
    }
}

/// Sends an event; false means the consumer dropped the receiver and the
/// flow is over.
fn emit(tx: &mpsc::UnboundedSender<WatcherEvent>, event: WatcherEvent) -> bool {
    tx.send(event).is_ok()
}

async fn fetch_qr(
    backend: &Arc<dyn Backend>,
    channel_id: Uuid,
    tx: &mpsc::UnboundedSender<WatcherEvent>,
) -> bool {
    match backend.qr_code(channel_id).await {
        Ok(png) => emit(tx, WatcherEvent::Qr(png)),
        Err(e) => {
            warn!(channel_id = %channel_id, error = %e, "qr fetch failed");
            emit(tx, WatcherEvent::PollError(e.to_string()))
        }
    }
}
