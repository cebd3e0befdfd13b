// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock desk backend for deterministic testing.
//!
//! `MockBackend` implements `Backend` with scripted responses and a call
//! log, enabling fast, CI-runnable tests without a desk server.
//!
//! Responses are popped from per-operation FIFO queues; when a queue is
//! empty a sensible default is returned. Failures are injected with
//! [`MockBackend::fail_next`] and consumed by the next call of that kind.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use balcao_core::types::{
    Agent, AgentRole, AssignmentUpdate, Channel, ConversationCounts, ConversationDetail,
    ConversationPage, ConversationQuery, Direction, ImportJob, ImportStatus, LoginSession,
    MediaAttachment, Message, MessageKind, MessageTemplate, OutboundMessage, Pagination,
    SessionStatus,
};
use balcao_core::{Backend, BalcaoError};

use crate::fixtures;

/// Identifies one backend operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Login,
    ListConversations,
    ConversationDetail,
    MarkRead,
    UpdateAssignment,
    ToggleArchive,
    TogglePin,
    ToggleAi,
    SendMessage,
    SendMedia,
    UploadMedia,
    CreateNote,
    ListChannels,
    SessionStatus,
    QrCode,
    ConversationCounts,
    ListAgents,
    ListTemplates,
    CreateImport,
    ImportProgress,
}

/// One recorded backend call with the arguments tests assert on.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Login {
        email: String,
    },
    ListConversations(ConversationQuery),
    ConversationDetail {
        conversation_id: Uuid,
    },
    MarkRead {
        conversation_id: Uuid,
    },
    UpdateAssignment {
        conversation_id: Uuid,
        assigned_agent_id: Option<Uuid>,
    },
    ToggleArchive {
        conversation_id: Uuid,
    },
    TogglePin {
        conversation_id: Uuid,
    },
    ToggleAi {
        conversation_id: Uuid,
    },
    SendMessage {
        conversation_id: Uuid,
        content: String,
    },
    SendMedia {
        conversation_id: Uuid,
        kind: MessageKind,
    },
    UploadMedia {
        filename: String,
    },
    CreateNote {
        conversation_id: Uuid,
    },
    ListChannels,
    SessionStatus {
        channel_id: Uuid,
    },
    QrCode {
        channel_id: Uuid,
    },
    ConversationCounts,
    ListAgents,
    ListTemplates,
    CreateImport {
        filename: String,
    },
    ImportProgress {
        job_id: Uuid,
    },
}

impl BackendCall {
    pub fn kind(&self) -> CallKind {
        match self {
            BackendCall::Login { .. } => CallKind::Login,
            BackendCall::ListConversations(_) => CallKind::ListConversations,
            BackendCall::ConversationDetail { .. } => CallKind::ConversationDetail,
            BackendCall::MarkRead { .. } => CallKind::MarkRead,
            BackendCall::UpdateAssignment { .. } => CallKind::UpdateAssignment,
            BackendCall::ToggleArchive { .. } => CallKind::ToggleArchive,
            BackendCall::TogglePin { .. } => CallKind::TogglePin,
            BackendCall::ToggleAi { .. } => CallKind::ToggleAi,
            BackendCall::SendMessage { .. } => CallKind::SendMessage,
            BackendCall::SendMedia { .. } => CallKind::SendMedia,
            BackendCall::UploadMedia { .. } => CallKind::UploadMedia,
            BackendCall::CreateNote { .. } => CallKind::CreateNote,
            BackendCall::ListChannels => CallKind::ListChannels,
            BackendCall::SessionStatus { .. } => CallKind::SessionStatus,
            BackendCall::QrCode { .. } => CallKind::QrCode,
            BackendCall::ConversationCounts => CallKind::ConversationCounts,
            BackendCall::ListAgents => CallKind::ListAgents,
            BackendCall::ListTemplates => CallKind::ListTemplates,
            BackendCall::CreateImport { .. } => CallKind::CreateImport,
            BackendCall::ImportProgress { .. } => CallKind::ImportProgress,
        }
    }
}

/// A mock desk backend with scripted responses.
///
/// Toggle operations keep per-conversation state and flip it on each call,
/// matching the real endpoints. All other defaults are empty or zeroed.
pub struct MockBackend {
    pages: Arc<Mutex<VecDeque<ConversationPage>>>,
    details: Arc<Mutex<VecDeque<ConversationDetail>>>,
    counts: Arc<Mutex<VecDeque<ConversationCounts>>>,
    sessions: Arc<Mutex<VecDeque<SessionStatus>>>,
    jobs: Arc<Mutex<VecDeque<ImportJob>>>,
    sends: Arc<Mutex<VecDeque<Message>>>,
    channels: Arc<Mutex<Vec<Channel>>>,
    agents: Arc<Mutex<Vec<Agent>>>,
    templates: Arc<Mutex<Vec<MessageTemplate>>>,
    archived: Arc<Mutex<HashMap<Uuid, bool>>>,
    pinned: Arc<Mutex<HashMap<Uuid, bool>>>,
    ai_enabled: Arc<Mutex<HashMap<Uuid, bool>>>,
    errors: Arc<Mutex<HashMap<CallKind, VecDeque<BalcaoError>>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl MockBackend {
    /// Create a new mock backend with empty queues.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(Mutex::new(VecDeque::new())),
            details: Arc::new(Mutex::new(VecDeque::new())),
            counts: Arc::new(Mutex::new(VecDeque::new())),
            sessions: Arc::new(Mutex::new(VecDeque::new())),
            jobs: Arc::new(Mutex::new(VecDeque::new())),
            sends: Arc::new(Mutex::new(VecDeque::new())),
            channels: Arc::new(Mutex::new(Vec::new())),
            agents: Arc::new(Mutex::new(Vec::new())),
            templates: Arc::new(Mutex::new(Vec::new())),
            archived: Arc::new(Mutex::new(HashMap::new())),
            pinned: Arc::new(Mutex::new(HashMap::new())),
            ai_enabled: Arc::new(Mutex::new(HashMap::new())),
            errors: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a conversation list page for the next `list_conversations` call.
    pub async fn push_page(&self, page: ConversationPage) {
        self.pages.lock().await.push_back(page);
    }

    /// Queue a conversation detail for the next `conversation_detail` call.
    pub async fn push_detail(&self, detail: ConversationDetail) {
        self.details.lock().await.push_back(detail);
    }

    /// Queue category counts for the next `conversation_counts` call.
    pub async fn push_counts(&self, counts: ConversationCounts) {
        self.counts.lock().await.push_back(counts);
    }

    /// Queue a session status for the next `session_status` call.
    pub async fn push_session(&self, status: SessionStatus) {
        self.sessions.lock().await.push_back(status);
    }

    /// Queue an import job snapshot for the next `import_progress` call.
    pub async fn push_job(&self, job: ImportJob) {
        self.jobs.lock().await.push_back(job);
    }

    /// Queue a stored message for the next `send_message` call.
    pub async fn push_send(&self, message: Message) {
        self.sends.lock().await.push_back(message);
    }

    pub async fn set_channels(&self, channels: Vec<Channel>) {
        *self.channels.lock().await = channels;
    }

    pub async fn set_agents(&self, agents: Vec<Agent>) {
        *self.agents.lock().await = agents;
    }

    pub async fn set_templates(&self, templates: Vec<MessageTemplate>) {
        *self.templates.lock().await = templates;
    }

    /// Make the next call of `kind` fail with `error`. Multiple injected
    /// errors for the same kind are consumed in order.
    pub async fn fail_next(&self, kind: CallKind, error: BalcaoError) {
        self.errors
            .lock()
            .await
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// All recorded calls, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// Number of recorded calls of the given kind.
    pub async fn call_count(&self, kind: CallKind) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Record the call, then fail if an error was injected for its kind.
    async fn begin(&self, call: BackendCall) -> Result<(), BalcaoError> {
        let kind = call.kind();
        self.calls.lock().await.push(call);
        let mut errors = self.errors.lock().await;
        if let Some(queue) = errors.get_mut(&kind) {
            if let Some(error) = queue.pop_front() {
                return Err(error);
            }
        }
        Ok(())
    }

    async fn flip(map: &Mutex<HashMap<Uuid, bool>>, id: Uuid, initial: bool) -> bool {
        let mut map = map.lock().await;
        let state = map.entry(id).or_insert(initial);
        *state = !*state;
        *state
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginSession, BalcaoError> {
        self.begin(BackendCall::Login {
            email: email.to_string(),
        })
        .await?;
        Ok(LoginSession {
            access_token: "mock-token".to_string(),
            refresh_token: None,
            agent: fixtures::agent("Test Agent", AgentRole::TenantUser),
            expires_in: Some(3600),
        })
    }

    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, BalcaoError> {
        self.begin(BackendCall::ListConversations(query.clone()))
            .await?;
        let scripted = self.pages.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| ConversationPage {
            conversations: Vec::new(),
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total: 0,
                total_pages: 0,
            },
        }))
    }

    async fn conversation_detail(
        &self,
        conversation_id: Uuid,
        _messages_limit: u32,
    ) -> Result<ConversationDetail, BalcaoError> {
        self.begin(BackendCall::ConversationDetail { conversation_id })
            .await?;
        let scripted = self.details.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| {
            fixtures::detail(fixtures::conversation(conversation_id), Vec::new())
        }))
    }

    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), BalcaoError> {
        self.begin(BackendCall::MarkRead { conversation_id }).await
    }

    async fn update_assignment(
        &self,
        conversation_id: Uuid,
        update: &AssignmentUpdate,
    ) -> Result<(), BalcaoError> {
        self.begin(BackendCall::UpdateAssignment {
            conversation_id,
            assigned_agent_id: update.assigned_agent_id,
        })
        .await
    }

    async fn toggle_archive(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        self.begin(BackendCall::ToggleArchive { conversation_id })
            .await?;
        Ok(Self::flip(&self.archived, conversation_id, false).await)
    }

    async fn toggle_pin(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        self.begin(BackendCall::TogglePin { conversation_id })
            .await?;
        Ok(Self::flip(&self.pinned, conversation_id, false).await)
    }

    async fn toggle_ai(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        self.begin(BackendCall::ToggleAi { conversation_id }).await?;
        Ok(Self::flip(&self.ai_enabled, conversation_id, true).await)
    }

    async fn send_message(&self, outbound: &OutboundMessage) -> Result<Message, BalcaoError> {
        self.begin(BackendCall::SendMessage {
            conversation_id: outbound.conversation_id,
            content: outbound.content.clone(),
        })
        .await?;
        let scripted = self.sends.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| {
            fixtures::text_message(outbound.conversation_id, Direction::Out, &outbound.content)
        }))
    }

    async fn send_media(
        &self,
        conversation_id: Uuid,
        kind: MessageKind,
        _attachment: &MediaAttachment,
        _caption: Option<&str>,
    ) -> Result<(), BalcaoError> {
        self.begin(BackendCall::SendMedia {
            conversation_id,
            kind,
        })
        .await
    }

    async fn upload_media(
        &self,
        filename: &str,
        mimetype: &str,
        _bytes: Vec<u8>,
    ) -> Result<MediaAttachment, BalcaoError> {
        self.begin(BackendCall::UploadMedia {
            filename: filename.to_string(),
        })
        .await?;
        Ok(MediaAttachment {
            url: format!("https://cdn.example.com/media/{filename}"),
            mimetype: mimetype.to_string(),
            filename: filename.to_string(),
        })
    }

    async fn create_note(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Message, BalcaoError> {
        self.begin(BackendCall::CreateNote { conversation_id })
            .await?;
        let mut note = fixtures::text_message(conversation_id, Direction::Note, content);
        note.is_note = true;
        Ok(note)
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, BalcaoError> {
        self.begin(BackendCall::ListChannels).await?;
        Ok(self.channels.lock().await.clone())
    }

    async fn session_status(&self, channel_id: Uuid) -> Result<SessionStatus, BalcaoError> {
        self.begin(BackendCall::SessionStatus { channel_id }).await?;
        let scripted = self.sessions.lock().await.pop_front();
        Ok(scripted.unwrap_or_default())
    }

    async fn qr_code(&self, channel_id: Uuid) -> Result<Vec<u8>, BalcaoError> {
        self.begin(BackendCall::QrCode { channel_id }).await?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn conversation_counts(&self) -> Result<ConversationCounts, BalcaoError> {
        self.begin(BackendCall::ConversationCounts).await?;
        let scripted = self.counts.lock().await.pop_front();
        Ok(scripted.unwrap_or_default())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, BalcaoError> {
        self.begin(BackendCall::ListAgents).await?;
        Ok(self.agents.lock().await.clone())
    }

    async fn list_templates(&self) -> Result<Vec<MessageTemplate>, BalcaoError> {
        self.begin(BackendCall::ListTemplates).await?;
        Ok(self.templates.lock().await.clone())
    }

    async fn create_import(&self, filename: &str, _csv: Vec<u8>) -> Result<Uuid, BalcaoError> {
        self.begin(BackendCall::CreateImport {
            filename: filename.to_string(),
        })
        .await?;
        Ok(Uuid::new_v4())
    }

    async fn import_progress(&self, job_id: Uuid) -> Result<ImportJob, BalcaoError> {
        self.begin(BackendCall::ImportProgress { job_id }).await?;
        let scripted = self.jobs.lock().await.pop_front();
        Ok(scripted
            .unwrap_or_else(|| fixtures::import_job(job_id, ImportStatus::Pending, 0, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_pages_returned_in_order() {
        let mock = MockBackend::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        mock.push_page(fixtures::page(vec![fixtures::conversation(first)]))
            .await;
        mock.push_page(fixtures::page(vec![fixtures::conversation(second)]))
            .await;

        let query = ConversationQuery::default();
        let a = mock.list_conversations(&query).await.unwrap();
        let b = mock.list_conversations(&query).await.unwrap();
        let c = mock.list_conversations(&query).await.unwrap();

        assert_eq!(a.conversations[0].id, first);
        assert_eq!(b.conversations[0].id, second);
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn injected_error_consumed_by_next_call_only() {
        let mock = MockBackend::new();
        mock.fail_next(
            CallKind::ConversationCounts,
            BalcaoError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        )
        .await;

        assert!(mock.conversation_counts().await.is_err());
        assert!(mock.conversation_counts().await.is_ok());
        assert_eq!(mock.call_count(CallKind::ConversationCounts).await, 2);
    }

    #[tokio::test]
    async fn toggles_flip_per_conversation_state() {
        let mock = MockBackend::new();
        let id = Uuid::new_v4();

        assert!(mock.toggle_archive(id).await.unwrap());
        assert!(!mock.toggle_archive(id).await.unwrap());
        // AI starts enabled, so the first toggle disables it.
        assert!(!mock.toggle_ai(id).await.unwrap());
        assert!(mock.toggle_ai(id).await.unwrap());
    }

    #[tokio::test]
    async fn call_log_captures_arguments() {
        let mock = MockBackend::new();
        let id = Uuid::new_v4();
        let agent_id = Uuid::new_v4();

        mock.update_assignment(id, &AssignmentUpdate::assign(agent_id))
            .await
            .unwrap();
        mock.update_assignment(id, &AssignmentUpdate::unassign())
            .await
            .unwrap();

        let calls = mock.calls().await;
        assert_eq!(
            calls[0],
            BackendCall::UpdateAssignment {
                conversation_id: id,
                assigned_agent_id: Some(agent_id),
            }
        );
        assert_eq!(
            calls[1],
            BackendCall::UpdateAssignment {
                conversation_id: id,
                assigned_agent_id: None,
            }
        );
    }

    #[tokio::test]
    async fn default_detail_echoes_requested_id() {
        let mock = MockBackend::new();
        let id = Uuid::new_v4();
        let detail = mock.conversation_detail(id, 50).await.unwrap();
        assert_eq!(detail.conversation.id, id);
        assert!(detail.messages.is_empty());
    }
}
