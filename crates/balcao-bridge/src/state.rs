// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side state machine for the QR pairing flow.
//!
//! The flow moves `disconnected → connecting → connected` and never
//! backwards: `connecting` begins when the QR code is requested, and
//! `connected` latches on the first WORKING observation. Bridge flapping
//! (STOPPED, FAILED, unknown states) while pairing keeps the flow in
//! `connecting`; the user may still scan, possibly after regenerating the
//! code.

use balcao_core::types::SessionState;
use strum::Display;

/// Connection state of one pairing flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// QR requested; session-status polling runs in this state only.
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Starts the pairing flow. Only meaningful from `Disconnected`; the
    /// other states are unchanged.
    pub fn begin(self) -> ConnectionState {
        match self {
            ConnectionState::Disconnected => ConnectionState::Connecting,
            other => other,
        }
    }

    /// Advances the flow with a polled bridge status. WORKING completes the
    /// pairing; anything else leaves the state where it is, so a flapping
    /// bridge cannot silently abandon an open flow.
    pub fn observe(self, session: SessionState) -> ConnectionState {
        match self {
            ConnectionState::Connecting if session == SessionState::Working => {
                ConnectionState::Connected
            }
            other => other,
        }
    }

    /// Whether the session-status poller should be running.
    pub fn should_poll(self) -> bool {
        self == ConnectionState::Connecting
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_only_moves_out_of_disconnected() {
        assert_eq!(
            ConnectionState::Disconnected.begin(),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::Connecting.begin(),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::Connected.begin(),
            ConnectionState::Connected
        );
    }

    #[test]
    fn working_completes_the_flow() {
        let state = ConnectionState::Disconnected.begin();
        assert_eq!(
            state.observe(SessionState::Working),
            ConnectionState::Connected
        );
    }

    #[test]
    fn non_working_statuses_keep_the_flow_open() {
        let state = ConnectionState::Connecting;
        for session in [
            SessionState::ScanQrCode,
            SessionState::Starting,
            SessionState::Stopped,
            SessionState::Failed,
            SessionState::Unknown,
        ] {
            assert_eq!(state.observe(session), ConnectionState::Connecting);
            assert!(state.observe(session).should_poll());
        }
    }

    #[test]
    fn connected_latches() {
        let state = ConnectionState::Connected;
        assert_eq!(
            state.observe(SessionState::Stopped),
            ConnectionState::Connected
        );
        assert_eq!(
            state.observe(SessionState::Working),
            ConnectionState::Connected
        );
        assert!(!state.should_poll());
    }

    #[test]
    fn observations_without_begin_are_inert() {
        // The flow only reacts to the bridge once the QR was requested.
        assert_eq!(
            ConnectionState::Disconnected.observe(SessionState::Working),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn connected_edge_fires_exactly_once_over_a_noisy_sequence() {
        let mut state = ConnectionState::Disconnected.begin();
        let mut edges = 0;
        for session in [
            SessionState::ScanQrCode,
            SessionState::ScanQrCode,
            SessionState::Working,
            SessionState::Working,
            SessionState::Stopped,
        ] {
            let next = state.observe(session);
            if next.is_connected() && !state.is_connected() {
                edges += 1;
            }
            state = next;
        }
        assert_eq!(edges, 1);
    }

    #[test]
    fn states_render_kebab_case() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
