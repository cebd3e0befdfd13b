// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbox filter categories and their query derivation.
//!
//! Each category maps to exactly one set of list query parameters. The
//! mapping is a pure function; no category ever combines two mutually
//! exclusive parameter sets.

use balcao_core::types::ConversationQuery;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// The four inbox tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum InboxFilter {
    /// Conversations with no assigned agent.
    #[default]
    Unassigned,
    /// Conversations assigned to any agent.
    InProgress,
    /// Conversations assigned to the current agent.
    Mine,
    /// Archived conversations, regardless of assignment.
    Archived,
}

impl InboxFilter {
    /// Derives the list query for this category.
    ///
    /// - `Archived`   -> `archived=true`
    /// - `Mine`       -> `archived=false, assigned_agent_id=<agent>`
    /// - `InProgress` -> `archived=false, has_agent=true`
    /// - `Unassigned` -> `archived=false, has_agent=false`
    pub fn query(
        self,
        agent_id: Uuid,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> ConversationQuery {
        let base = ConversationQuery {
            page,
            limit,
            search: search.map(str::to_string),
            ..ConversationQuery::default()
        };
        match self {
            InboxFilter::Archived => ConversationQuery {
                archived: true,
                ..base
            },
            InboxFilter::Mine => ConversationQuery {
                archived: false,
                assigned_agent_id: Some(agent_id),
                ..base
            },
            InboxFilter::InProgress => ConversationQuery {
                archived: false,
                has_agent: Some(true),
                ..base
            },
            InboxFilter::Unassigned => ConversationQuery {
                archived: false,
                has_agent: Some(false),
                ..base
            },
        }
    }
}
