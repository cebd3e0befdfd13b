// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single-owner inbox engine.
//!
//! [`InboxEngine`] owns the caches, the debouncer, the composer, and the
//! selection. Queries (list, detail, counts) are awaited inline and served
//! from cache while fresh. Mutations are dispatched onto tokio tasks and
//! settle through the engine's signal channel, so two actions can race;
//! whichever server response lands last wins, and each completion
//! invalidates through the central table.
//!
//! Drive the engine from one task: call dispatchers and queries, and pump
//! [`InboxEngine::next_update`] for debounce commits and mutation
//! completions. Mutation tasks left in flight when the engine drops run to
//! completion and their results are discarded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use balcao_config::model::InboxConfig;
use balcao_core::types::{
    Agent, AssignmentUpdate, Channel, ConversationCounts, ConversationDetail, ConversationPage,
    Message, MessageKind, MessageTemplate,
};
use balcao_core::{Backend, BalcaoError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{InboxCache, ListKey};
use crate::composer::{Composer, OutboundEntry};
use crate::debounce::{SearchCommit, SearchDebouncer};
use crate::filter::InboxFilter;
use crate::invalidation::{scopes_for, MutationKind};

/// Whether the acting agent may delegate a conversation, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationGate {
    Allowed,
    /// Only admins can hand a conversation to another agent.
    NotAdmin,
    /// The conversation's channel has no bridge session to deliver through.
    NoSession,
}

impl DelegationGate {
    pub fn is_allowed(self) -> bool {
        matches!(self, DelegationGate::Allowed)
    }

    /// Human-readable reason for a blocked gate.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            DelegationGate::Allowed => None,
            DelegationGate::NotAdmin => Some("only admins can delegate conversations"),
            DelegationGate::NoSession => {
                Some("the conversation's channel has no connected WhatsApp session")
            }
        }
    }
}

/// Evaluates the delegation preconditions. Both are checked independently;
/// admin status first.
pub fn delegation_gate(agent: &Agent, channel: Option<&Channel>) -> DelegationGate {
    if !agent.is_admin() {
        return DelegationGate::NotAdmin;
    }
    match channel {
        Some(channel) if channel.has_session() => DelegationGate::Allowed,
        _ => DelegationGate::NoSession,
    }
}

/// In-flight mutation tally per kind. Consumers read it to disable the
/// matching control; the engine never blocks a dispatch on it.
#[derive(Debug, Default)]
pub struct PendingActions {
    in_flight: HashMap<MutationKind, usize>,
}

impl PendingActions {
    fn begin(&mut self, kind: MutationKind) {
        *self.in_flight.entry(kind).or_insert(0) += 1;
    }

    fn finish(&mut self, kind: MutationKind) {
        if let Some(count) = self.in_flight.get_mut(&kind) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&kind);
            }
        }
    }

    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub fn any(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

/// What a pumped signal did to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    /// The trailing debounce timer committed and the list was refetched.
    SearchApplied { term: Option<String> },
    /// A dispatched mutation settled; on success its cache scopes are now
    /// stale. `error` carries the failure text otherwise.
    MutationSettled {
        kind: MutationKind,
        conversation_id: Uuid,
        error: Option<String>,
    },
}

enum MutationResult {
    Unit(Result<(), BalcaoError>),
    Toggle(Result<bool, BalcaoError>),
    Send {
        local_id: Uuid,
        result: Result<Message, BalcaoError>,
    },
}

struct MutationDone {
    kind: MutationKind,
    conversation_id: Uuid,
    result: MutationResult,
}

/// Synchronization engine for the conversation inbox.
pub struct InboxEngine {
    backend: Arc<dyn Backend>,
    agent: Agent,
    page_size: u32,
    messages_limit: u32,
    cache: InboxCache,
    filter: InboxFilter,
    page: u32,
    /// Committed search term; `None` means unfiltered.
    search: Option<String>,
    debouncer: SearchDebouncer,
    search_rx: mpsc::UnboundedReceiver<SearchCommit>,
    mutation_tx: mpsc::UnboundedSender<MutationDone>,
    mutation_rx: mpsc::UnboundedReceiver<MutationDone>,
    selected: Option<Uuid>,
    composer: Composer,
    pending: PendingActions,
}

impl InboxEngine {
    pub fn new(backend: Arc<dyn Backend>, agent: Agent, config: &InboxConfig) -> Self {
        let (debouncer, search_rx) =
            SearchDebouncer::new(Duration::from_millis(config.search_debounce_ms));
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        info!(agent = %agent.name, "inbox engine initialized");
        Self {
            backend,
            agent,
            page_size: config.page_size,
            messages_limit: config.messages_limit,
            cache: InboxCache::new(),
            filter: InboxFilter::default(),
            page: 1,
            search: None,
            debouncer,
            search_rx,
            mutation_tx,
            mutation_rx,
            selected: None,
            composer: Composer::new(),
            pending: PendingActions::default(),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn filter(&self) -> InboxFilter {
        self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn pending(&self) -> &PendingActions {
        &self.pending
    }

    /// The committed search term driving the current list.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// The raw search input, ahead of the debounce window.
    pub fn search_input(&self) -> &str {
        self.debouncer.input()
    }

    /// True while a fetch would be needed or a debounce is still running;
    /// consumers render a skeleton instead of flickering an empty list.
    pub fn is_list_loading(&self) -> bool {
        self.debouncer.is_pending() || self.cache.fresh_list(&self.current_key()).is_none()
    }

    fn current_key(&self) -> ListKey {
        ListKey {
            filter: self.filter,
            search: self.search.clone(),
            page: self.page,
        }
    }

    // --- Queries ---

    /// The current list page, fetched if the cache has no fresh value.
    pub async fn list(&mut self) -> Result<&ConversationPage, BalcaoError> {
        let key = self.current_key();
        if self.cache.fresh_list(&key).is_none() {
            let query =
                self.filter
                    .query(self.agent.id, self.search.as_deref(), self.page, self.page_size);
            debug!(filter = %self.filter, page = self.page, "fetching conversation list");
            let page = self.backend.list_conversations(&query).await?;
            self.cache.fill_list(key.clone(), page);
        }
        self.cache
            .fresh_list(&key)
            .ok_or_else(|| BalcaoError::Internal("list cache slot vanished after fill".into()))
    }

    /// The last known page for the current key, fresh or stale. Consumers
    /// keep rendering this when [`InboxEngine::list`] fails, alongside a
    /// retry affordance.
    pub fn stale_list(&self) -> Option<&ConversationPage> {
        self.cache.any_list(&self.current_key())
    }

    pub async fn set_filter(
        &mut self,
        filter: InboxFilter,
    ) -> Result<&ConversationPage, BalcaoError> {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
        self.list().await
    }

    pub async fn set_page(&mut self, page: u32) -> Result<&ConversationPage, BalcaoError> {
        self.page = page.max(1);
        self.list().await
    }

    /// One conversation with its recent messages, cached until invalidated.
    pub async fn detail(
        &mut self,
        conversation_id: Uuid,
    ) -> Result<&ConversationDetail, BalcaoError> {
        if self.cache.fresh_detail(conversation_id).is_none() {
            debug!(conversation_id = %conversation_id, "fetching conversation detail");
            let detail = self
                .backend
                .conversation_detail(conversation_id, self.messages_limit)
                .await?;
            self.cache.fill_detail(conversation_id, detail);
        }
        self.cache
            .fresh_detail(conversation_id)
            .ok_or_else(|| BalcaoError::Internal("detail cache slot vanished after fill".into()))
    }

    /// Per-category unread tallies, cached until invalidated.
    pub async fn counts(&mut self) -> Result<ConversationCounts, BalcaoError> {
        if let Some(counts) = self.cache.fresh_counts() {
            return Ok(*counts);
        }
        let counts = self.backend.conversation_counts().await?;
        self.cache.fill_counts(counts);
        Ok(counts)
    }

    /// Agents of the same tenant, as delegation targets.
    pub async fn delegation_targets(&self) -> Result<Vec<Agent>, BalcaoError> {
        self.backend.list_agents().await
    }

    pub async fn templates(&self) -> Result<Vec<MessageTemplate>, BalcaoError> {
        self.backend.list_templates().await
    }

    // --- Selection ---

    /// Opens a conversation: remembers the selection, marks it read in the
    /// background, and returns the detail. The mark-read failure, if any,
    /// arrives as a settled update rather than failing the open.
    pub async fn select(
        &mut self,
        conversation_id: Uuid,
    ) -> Result<&ConversationDetail, BalcaoError> {
        self.selected = Some(conversation_id);
        self.composer.clear_draft();

        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::MarkRead, conversation_id, async move {
            MutationResult::Unit(backend.mark_read(conversation_id).await)
        });

        self.detail(conversation_id).await
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // --- Search ---

    /// Records a keystroke. The term commits after the configured quiet
    /// period and surfaces as [`EngineUpdate::SearchApplied`].
    pub fn type_search(&mut self, input: &str) {
        self.debouncer.set_input(input);
    }

    // --- Mutation dispatch ---

    pub fn assign_to_self(&mut self, conversation_id: Uuid) {
        let backend = self.backend.clone();
        let update = AssignmentUpdate::assign(self.agent.id);
        info!(conversation_id = %conversation_id, "assigning conversation to self");
        self.spawn_mutation(MutationKind::Assign, conversation_id, async move {
            MutationResult::Unit(backend.update_assignment(conversation_id, &update).await)
        });
    }

    pub fn unassign(&mut self, conversation_id: Uuid) {
        let backend = self.backend.clone();
        info!(conversation_id = %conversation_id, "unassigning conversation");
        self.spawn_mutation(MutationKind::Unassign, conversation_id, async move {
            MutationResult::Unit(
                backend
                    .update_assignment(conversation_id, &AssignmentUpdate::unassign())
                    .await,
            )
        });
    }

    /// Hands the conversation to another agent. Gated client-side: the
    /// actor must be an admin and the channel must carry a session.
    pub async fn delegate(
        &mut self,
        conversation_id: Uuid,
        target_agent_id: Uuid,
    ) -> Result<(), BalcaoError> {
        let channel = self
            .detail(conversation_id)
            .await?
            .conversation
            .channel
            .clone();
        let gate = delegation_gate(&self.agent, channel.as_ref());
        if let Some(reason) = gate.reason() {
            return Err(BalcaoError::Validation(reason.to_string()));
        }

        let backend = self.backend.clone();
        let update = AssignmentUpdate::assign(target_agent_id);
        info!(
            conversation_id = %conversation_id,
            target = %target_agent_id,
            "delegating conversation"
        );
        self.spawn_mutation(MutationKind::Delegate, conversation_id, async move {
            MutationResult::Unit(backend.update_assignment(conversation_id, &update).await)
        });
        Ok(())
    }

    pub fn toggle_archive(&mut self, conversation_id: Uuid) {
        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::Archive, conversation_id, async move {
            MutationResult::Toggle(backend.toggle_archive(conversation_id).await)
        });
    }

    pub fn toggle_pin(&mut self, conversation_id: Uuid) {
        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::Pin, conversation_id, async move {
            MutationResult::Toggle(backend.toggle_pin(conversation_id).await)
        });
    }

    pub fn toggle_ai(&mut self, conversation_id: Uuid) {
        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::ToggleAi, conversation_id, async move {
            MutationResult::Toggle(backend.toggle_ai(conversation_id).await)
        });
    }

    /// Sends the composer draft to the selected conversation. The draft is
    /// cleared optimistically; the attempt is tracked in the outbox.
    pub fn send_draft(&mut self) -> Result<Uuid, BalcaoError> {
        let conversation_id = self.selected.ok_or_else(|| {
            BalcaoError::Validation("no conversation selected".to_string())
        })?;
        let (local_id, outbound) = self.composer.begin_send(conversation_id)?;

        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::SendMessage, conversation_id, async move {
            MutationResult::Send {
                local_id,
                result: backend.send_message(&outbound).await,
            }
        });
        Ok(local_id)
    }

    /// Re-attempts a failed outbox entry.
    pub fn resend(&mut self, local_id: Uuid) -> Result<(), BalcaoError> {
        let outbound = self.composer.begin_resend(local_id)?;
        let conversation_id = outbound.conversation_id;

        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::SendMessage, conversation_id, async move {
            MutationResult::Send {
                local_id,
                result: backend.send_message(&outbound).await,
            }
        });
        Ok(())
    }

    /// Uploads a file and sends it as a media message.
    pub fn send_media(
        &mut self,
        conversation_id: Uuid,
        kind: MessageKind,
        filename: String,
        mimetype: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    ) {
        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::SendMedia, conversation_id, async move {
            let result = match backend.upload_media(&filename, &mimetype, bytes).await {
                Ok(attachment) => {
                    backend
                        .send_media(conversation_id, kind, &attachment, caption.as_deref())
                        .await
                }
                Err(error) => Err(error),
            };
            MutationResult::Unit(result)
        });
    }

    /// Creates an internal note; never delivered to the customer.
    pub fn create_note(
        &mut self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<(), BalcaoError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(BalcaoError::Validation("note content is empty".to_string()));
        }

        let backend = self.backend.clone();
        self.spawn_mutation(MutationKind::CreateNote, conversation_id, async move {
            MutationResult::Unit(
                backend
                    .create_note(conversation_id, &content)
                    .await
                    .map(|_| ()),
            )
        });
        Ok(())
    }

    // --- Composer ---

    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    pub fn set_draft(&mut self, text: &str) {
        self.composer.set_draft(text);
    }

    /// Renders a template into the draft. Local only; no request, no
    /// invalidation.
    pub fn apply_template(
        &mut self,
        template: &MessageTemplate,
        values: &HashMap<String, String>,
    ) -> Result<(), BalcaoError> {
        self.composer.apply_template(template, values)
    }

    pub fn outbox(&self) -> &[OutboundEntry] {
        self.composer.outbox()
    }

    pub fn outbox_for(&self, conversation_id: Uuid) -> Vec<&OutboundEntry> {
        self.composer.outbox_for(conversation_id)
    }

    pub fn prune_delivered(&mut self) {
        self.composer.prune_delivered();
    }

    // --- Signal pump ---

    /// Waits for the next timer or mutation signal and applies it.
    ///
    /// Returns an error only when applying a search commit fails to refetch
    /// the list; mutation failures settle into
    /// [`EngineUpdate::MutationSettled`] instead.
    pub async fn next_update(&mut self) -> Result<EngineUpdate, BalcaoError> {
        loop {
            tokio::select! {
                Some(commit) = self.search_rx.recv() => {
                    if let Some(update) = self.apply_search_commit(commit).await? {
                        return Ok(update);
                    }
                    // Stale commit superseded by newer input; keep waiting.
                }
                Some(done) = self.mutation_rx.recv() => {
                    return Ok(self.settle_mutation(done));
                }
            }
        }
    }

    async fn apply_search_commit(
        &mut self,
        commit: SearchCommit,
    ) -> Result<Option<EngineUpdate>, BalcaoError> {
        if !self.debouncer.confirm(&commit) {
            return Ok(None);
        }

        let trimmed = commit.term.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.page = 1;
        info!(term = ?self.search, "search term committed");

        self.list().await?;
        Ok(Some(EngineUpdate::SearchApplied {
            term: self.search.clone(),
        }))
    }

    fn settle_mutation(&mut self, done: MutationDone) -> EngineUpdate {
        self.pending.finish(done.kind);

        let (succeeded, error) = match done.result {
            MutationResult::Unit(Ok(())) => (true, None),
            MutationResult::Unit(Err(e)) => (false, Some(e.to_string())),
            MutationResult::Toggle(Ok(state)) => {
                if done.kind == MutationKind::Archive
                    && state
                    && self.selected == Some(done.conversation_id)
                {
                    info!(
                        conversation_id = %done.conversation_id,
                        "selected conversation archived, clearing selection"
                    );
                    self.selected = None;
                }
                (true, None)
            }
            MutationResult::Toggle(Err(e)) => (false, Some(e.to_string())),
            MutationResult::Send { local_id, result } => {
                // The server persisting a bridge-rejected message still
                // counts as a mutation; only a request failure leaves the
                // server untouched.
                let succeeded = result.is_ok();
                let error = result.as_ref().err().map(|e| e.to_string());
                self.composer.resolve_send(local_id, result);
                (succeeded, error)
            }
        };

        if succeeded {
            for scope in scopes_for(done.kind) {
                self.cache.invalidate(*scope, Some(done.conversation_id));
            }
            debug!(kind = %done.kind, conversation_id = %done.conversation_id, "caches invalidated");
        } else if let Some(error) = &error {
            warn!(kind = %done.kind, error = %error, "mutation failed");
        }

        EngineUpdate::MutationSettled {
            kind: done.kind,
            conversation_id: done.conversation_id,
            error,
        }
    }

    fn spawn_mutation<F>(&mut self, kind: MutationKind, conversation_id: Uuid, fut: F)
    where
        F: Future<Output = MutationResult> + Send + 'static,
    {
        self.pending.begin(kind);
        let tx = self.mutation_tx.clone();
        tokio::spawn(async move {
            let result = fut.await;
            // The engine may already be gone; the result is then discarded.
            let _ = tx.send(MutationDone {
                kind,
                conversation_id,
                result,
            });
        });
    }
}
