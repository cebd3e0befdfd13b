// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend seam between the sync engines and the desk API.
//!
//! Everything above this trait (caches, pollers, the CLI) talks to the
//! backend only through it, so tests substitute a scripted double without
//! touching the HTTP client.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BalcaoError;
use crate::types::{
    Agent, AssignmentUpdate, Channel, ConversationCounts, ConversationDetail, ConversationPage,
    ConversationQuery, ImportJob, LoginSession, MediaAttachment, Message, MessageKind,
    MessageTemplate, OutboundMessage, SessionStatus,
};

/// Desk API surface used by the synchronization engines.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges credentials for an access token and operator identity.
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession, BalcaoError>;

    /// Fetches one page of the conversation list.
    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, BalcaoError>;

    /// Fetches one conversation with its most recent messages, oldest first.
    async fn conversation_detail(
        &self,
        conversation_id: Uuid,
        messages_limit: u32,
    ) -> Result<ConversationDetail, BalcaoError>;

    /// Clears the unread counter for a conversation.
    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), BalcaoError>;

    /// Assigns, delegates, or unassigns a conversation.
    async fn update_assignment(
        &self,
        conversation_id: Uuid,
        update: &AssignmentUpdate,
    ) -> Result<(), BalcaoError>;

    /// Toggles the archived flag; returns the new value.
    async fn toggle_archive(&self, conversation_id: Uuid) -> Result<bool, BalcaoError>;

    /// Toggles the pinned flag; returns the new value.
    async fn toggle_pin(&self, conversation_id: Uuid) -> Result<bool, BalcaoError>;

    /// Toggles the AI assistant for a conversation; returns the new value.
    async fn toggle_ai(&self, conversation_id: Uuid) -> Result<bool, BalcaoError>;

    /// Sends a text message; the returned message carries the server's
    /// delivery status.
    async fn send_message(&self, outbound: &OutboundMessage) -> Result<Message, BalcaoError>;

    /// Sends an already-uploaded media file. The endpoint relays the bridge
    /// response rather than the stored message, so the caller refetches the
    /// detail to observe the send.
    async fn send_media(
        &self,
        conversation_id: Uuid,
        kind: MessageKind,
        attachment: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<(), BalcaoError>;

    /// Uploads a media file, returning the attachment reference to send.
    async fn upload_media(
        &self,
        filename: &str,
        mimetype: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaAttachment, BalcaoError>;

    /// Creates an internal note on a conversation. Notes are never
    /// delivered to the customer.
    async fn create_note(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Message, BalcaoError>;

    /// Lists the tenant's messaging channels.
    async fn list_channels(&self) -> Result<Vec<Channel>, BalcaoError>;

    /// Fetches the raw bridge session status for one channel.
    async fn session_status(&self, channel_id: Uuid) -> Result<SessionStatus, BalcaoError>;

    /// Fetches the current pairing QR code as PNG bytes. Fails with a 409
    /// when the session is already connected.
    async fn qr_code(&self, channel_id: Uuid) -> Result<Vec<u8>, BalcaoError>;

    /// Fetches unread tallies per inbox category.
    async fn conversation_counts(&self) -> Result<ConversationCounts, BalcaoError>;

    /// Lists the tenant's agents, for delegation targets.
    async fn list_agents(&self) -> Result<Vec<Agent>, BalcaoError>;

    /// Lists the operator's message templates.
    async fn list_templates(&self) -> Result<Vec<MessageTemplate>, BalcaoError>;

    /// Uploads a CSV and starts a bulk import job, returning the job id.
    async fn create_import(&self, filename: &str, csv: Vec<u8>) -> Result<Uuid, BalcaoError>;

    /// Fetches the current progress of an import job.
    async fn import_progress(&self, job_id: Uuid) -> Result<ImportJob, BalcaoError>;
}
