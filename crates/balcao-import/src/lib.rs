// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk import watching.
//!
//! The client never parses CSVs; it submits the file bytes and watches the
//! server-side job through [`ImportWatcher`] until the status turns
//! terminal.

pub mod poller;

pub use poller::{ImportEvent, ImportWatcher};
