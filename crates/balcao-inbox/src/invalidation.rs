// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Central mutation-to-cache-scope table.
//!
//! Every server mutation invalidates through this table; nothing patches a
//! cache directly. Template application is absent on purpose: it is a local
//! draft edit with no server call.

use strum::{Display, EnumIter};

/// Server mutations the engine dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum MutationKind {
    Assign,
    Unassign,
    Delegate,
    Archive,
    Pin,
    ToggleAi,
    SendMessage,
    SendMedia,
    CreateNote,
    MarkRead,
}

/// Cache families a mutation can invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum CacheScope {
    /// Every cached conversation list page.
    List,
    /// The mutated conversation's detail entry.
    Detail,
    /// The per-category badge tallies.
    Counts,
}

const ALL_SCOPES: &[CacheScope] = &[CacheScope::List, CacheScope::Detail, CacheScope::Counts];

/// The scopes invalidated after a mutation of `kind` succeeds.
///
/// Every mutation moves a conversation between categories, changes its
/// detail, or changes an unread tally, so every row currently maps to all
/// three scopes. New kinds must be added here; the completeness test fails
/// otherwise.
pub fn scopes_for(kind: MutationKind) -> &'static [CacheScope] {
    match kind {
        MutationKind::Assign
        | MutationKind::Unassign
        | MutationKind::Delegate
        | MutationKind::Archive
        | MutationKind::Pin
        | MutationKind::ToggleAi
        | MutationKind::SendMessage
        | MutationKind::SendMedia
        | MutationKind::CreateNote
        | MutationKind::MarkRead => ALL_SCOPES,
    }
}
