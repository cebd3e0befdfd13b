// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp bridge pairing and channel monitoring.
//!
//! Pairing a channel means showing a QR code and waiting for the bridge to
//! report WORKING. [`QrWatcher`] runs that flow as a background task over
//! the explicit [`ConnectionState`] machine; [`ChannelRefresher`] keeps a
//! channels view current while it is open. Both stop cleanly on close or
//! drop.

pub mod refresher;
pub mod state;
pub mod watcher;

pub use refresher::{ChannelRefresher, RefreshEvent};
pub use state::ConnectionState;
pub use watcher::{QrWatcher, WatcherEvent};
