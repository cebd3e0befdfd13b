// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-mostly caches for list pages, conversation details, and counts.
//!
//! A slot is `Empty`, `Fresh`, or `Stale`. Invalidation downgrades fresh
//! values to stale instead of discarding them, so a failed refetch can keep
//! showing the previous page.

use std::collections::HashMap;

use balcao_core::types::{ConversationCounts, ConversationDetail, ConversationPage};
use uuid::Uuid;

use crate::filter::InboxFilter;
use crate::invalidation::CacheScope;

enum SlotState<T> {
    Empty,
    Fresh(T),
    Stale(T),
}

/// One cached value with freshness tracking.
pub struct CacheSlot<T> {
    state: SlotState<T>,
}

impl<T> CacheSlot<T> {
    pub fn new() -> Self {
        Self {
            state: SlotState::Empty,
        }
    }

    /// The cached value regardless of freshness.
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Fresh(v) | SlotState::Stale(v) => Some(v),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.state, SlotState::Fresh(_))
    }

    pub fn fill(&mut self, value: T) {
        self.state = SlotState::Fresh(value);
    }

    /// Downgrades a fresh value to stale. Empty slots stay empty.
    pub fn invalidate(&mut self) {
        let state = std::mem::replace(&mut self.state, SlotState::Empty);
        self.state = match state {
            SlotState::Fresh(v) | SlotState::Stale(v) => SlotState::Stale(v),
            SlotState::Empty => SlotState::Empty,
        };
    }

    pub fn clear(&mut self) {
        self.state = SlotState::Empty;
    }
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for one list page: the category, the committed search term,
/// and the page number. The agent id is fixed per engine and not part of
/// the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub filter: InboxFilter,
    pub search: Option<String>,
    pub page: u32,
}

/// All inbox caches behind one invalidation entry point.
#[derive(Default)]
pub struct InboxCache {
    lists: HashMap<ListKey, CacheSlot<ConversationPage>>,
    details: HashMap<Uuid, CacheSlot<ConversationDetail>>,
    counts: CacheSlot<ConversationCounts>,
}

impl InboxCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh list page for the key, if any.
    pub fn fresh_list(&self, key: &ListKey) -> Option<&ConversationPage> {
        self.lists
            .get(key)
            .filter(|slot| slot.is_fresh())
            .and_then(|slot| slot.value())
    }

    /// Last known list page for the key, fresh or stale.
    pub fn any_list(&self, key: &ListKey) -> Option<&ConversationPage> {
        self.lists.get(key).and_then(|slot| slot.value())
    }

    pub fn fill_list(&mut self, key: ListKey, page: ConversationPage) {
        self.lists.entry(key).or_default().fill(page);
    }

    pub fn fresh_detail(&self, conversation_id: Uuid) -> Option<&ConversationDetail> {
        self.details
            .get(&conversation_id)
            .filter(|slot| slot.is_fresh())
            .and_then(|slot| slot.value())
    }

    pub fn any_detail(&self, conversation_id: Uuid) -> Option<&ConversationDetail> {
        self.details
            .get(&conversation_id)
            .and_then(|slot| slot.value())
    }

    pub fn fill_detail(&mut self, conversation_id: Uuid, detail: ConversationDetail) {
        self.details
            .entry(conversation_id)
            .or_default()
            .fill(detail);
    }

    pub fn fresh_counts(&self) -> Option<&ConversationCounts> {
        if self.counts.is_fresh() {
            self.counts.value()
        } else {
            None
        }
    }

    pub fn fill_counts(&mut self, counts: ConversationCounts) {
        self.counts.fill(counts);
    }

    /// Applies one invalidation scope. `List` downgrades every cached page
    /// (any mutation can reorder or recategorize the list); `Detail`
    /// downgrades the affected conversation only.
    pub fn invalidate(&mut self, scope: CacheScope, conversation_id: Option<Uuid>) {
        match scope {
            CacheScope::List => {
                for slot in self.lists.values_mut() {
                    slot.invalidate();
                }
            }
            CacheScope::Detail => match conversation_id {
                Some(id) => {
                    if let Some(slot) = self.details.get_mut(&id) {
                        slot.invalidate();
                    }
                }
                None => {
                    for slot in self.details.values_mut() {
                        slot.invalidate();
                    }
                }
            },
            CacheScope::Counts => self.counts.invalidate(),
        }
    }
}
