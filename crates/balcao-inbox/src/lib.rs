// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Headless synchronization engine for the conversation inbox.
//!
//! The crate keeps a client-side picture of the inbox consistent with the
//! backend: cached list pages, conversation details, and unread counts; a
//! debounced search box; an optimistic message composer with failed-send
//! recovery; and a dispatch layer that runs mutations concurrently and
//! invalidates exactly the caches each one touches.
//!
//! Everything hangs off [`InboxEngine`], which talks to the backend through
//! the [`balcao_core::Backend`] trait and is driven from a single task.

pub mod cache;
pub mod composer;
pub mod debounce;
pub mod engine;
pub mod filter;
pub mod invalidation;

pub use composer::OutboundEntry;
pub use engine::{delegation_gate, DelegationGate, EngineUpdate, InboxEngine, PendingActions};
pub use filter::InboxFilter;
pub use invalidation::{scopes_for, CacheScope, MutationKind};
