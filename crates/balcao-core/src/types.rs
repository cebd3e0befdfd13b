// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the balcao workspace.
//!
//! Wire-facing structs mirror the desk backend's JSON field names and stay
//! tolerant of extra fields; only configuration uses `deny_unknown_fields`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// --- Operators ---

/// Role of an authenticated desk operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentRole {
    SystemAdmin,
    TenantAdmin,
    TenantUser,
}

impl AgentRole {
    /// Admin roles may delegate conversations to other agents.
    pub fn is_admin(self) -> bool {
        matches!(self, AgentRole::SystemAdmin | AgentRole::TenantAdmin)
    }
}

/// A desk operator (the authenticated user or a delegation target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: AgentRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Agent {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Authenticated session returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "user")]
    pub agent: Agent,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

// --- Channels & bridge sessions ---

/// Connection status of a messaging channel, as persisted by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Raw session status reported by the WhatsApp bridge.
///
/// The wire values are the bridge's own screaming-snake strings; anything
/// unrecognized folds into `Unknown` so new bridge states cannot break
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    ScanQrCode,
    Starting,
    Working,
    Stopped,
    Failed,
    #[serde(other)]
    Unknown,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Unknown
    }
}

impl SessionState {
    /// Channel status derived from the bridge state: WORKING is connected,
    /// STARTING is connecting, everything else is disconnected.
    pub fn channel_status(self) -> ChannelStatus {
        match self {
            SessionState::Working => ChannelStatus::Connected,
            SessionState::Starting => ChannelStatus::Connecting,
            _ => ChannelStatus::Disconnected,
        }
    }
}

/// Identity of the account a bridge session is logged in as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "pushName")]
    pub push_name: Option<String>,
}

/// Ephemeral session status snapshot for one channel. Polled, never mutated
/// by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: SessionState,
    #[serde(default)]
    pub me: Option<SessionIdentity>,
}

/// A messaging channel bound to a bridge session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type", default)]
    pub channel_type: String,
    /// Opaque bridge session identifier; empty when the channel has never
    /// been configured with one.
    #[serde(default)]
    pub session: String,
    pub status: ChannelStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Channel {
    /// Whether a bridge session string is configured. Delegation and
    /// outbound delivery both require one.
    pub fn has_session(&self) -> bool {
        !self.session.trim().is_empty()
    }
}

// --- Conversations & messages ---

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConversationState {
    Open,
    Closed,
    Waiting,
}

impl Default for ConversationState {
    fn default() -> Self {
        ConversationState::Open
    }
}

/// Compact customer reference preloaded onto conversations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A conversation with a customer over one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub channel_id: Uuid,
    #[serde(default)]
    pub assigned_agent_id: Option<Uuid>,
    #[serde(default)]
    pub status: ConversationState,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "default_true")]
    pub ai_enabled: bool,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub assigned_agent: Option<Agent>,
}

impl Conversation {
    pub fn is_assigned(&self) -> bool {
        self.assigned_agent_id.is_some()
    }
}

/// Direction of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Note,
}

/// Payload type of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    Video,
    Document,
}

/// Delivery status of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    /// Null for inbound messages.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_name: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    pub direction: Direction,
    pub status: MessageStatus,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub is_note: bool,
    #[serde(default)]
    pub reply_to_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Detail payload for one conversation: the conversation plus its most
/// recent messages, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

// --- Pagination ---

/// Pagination envelope used by the conversations list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(default)]
    pub total_pages: u64,
}

/// One page of the conversation list, in server order (pinned first, then
/// most recent message first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationPage {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl ConversationPage {
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// Generic paginated response. The backend serves two shapes depending on
/// the endpoint generation: `{data, total, page, limit|per_page}` and
/// `{items, total}`. Both deserialize through this enum.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    Full {
        data: Vec<T>,
        total: u64,
        #[serde(default)]
        page: u32,
        #[serde(default, alias = "per_page")]
        limit: u32,
    },
    Slim {
        items: Vec<T>,
        total: u64,
    },
}

impl<T> Page<T> {
    pub fn total(&self) -> u64 {
        match self {
            Page::Full { total, .. } | Page::Slim { total, .. } => *total,
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Page::Full { data, .. } => data,
            Page::Slim { items, .. } => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Page::Full { data, .. } => data,
            Page::Slim { items, .. } => items,
        }
    }
}

// --- Counts ---

/// Unread-conversation tallies per inbox category. Wire keys are the
/// backend's Portuguese category names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationCounts {
    #[serde(rename = "novas")]
    pub unassigned: u64,
    #[serde(rename = "em_atendimento")]
    pub in_progress: u64,
    #[serde(rename = "minhas")]
    pub mine: u64,
    #[serde(rename = "arquivadas")]
    pub archived: u64,
}

// --- Outbound payloads ---

/// Payload for the text send endpoint. `resend_message_id` re-drives an
/// existing failed message instead of creating a new one. Both linkage ids
/// are strings because the backend accepts either its own ids or external
/// WhatsApp message ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub conversation_id: Uuid,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resend_message_id: Option<String>,
}

impl OutboundMessage {
    /// A plain text message with no reply or resend linkage.
    pub fn text(conversation_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            kind: MessageKind::Text,
            content: content.into(),
            reply_to_id: None,
            resend_message_id: None,
        }
    }
}

/// An already-uploaded media file to attach to a send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    pub mimetype: String,
    pub filename: String,
}

/// Assignment change for a conversation. `assigned_agent_id` serializes as
/// an explicit `null` to unassign; it is never omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentUpdate {
    pub assigned_agent_id: Option<Uuid>,
}

impl AssignmentUpdate {
    pub fn assign(agent_id: Uuid) -> Self {
        Self {
            assigned_agent_id: Some(agent_id),
        }
    }

    pub fn unassign() -> Self {
        Self {
            assigned_agent_id: None,
        }
    }
}

/// Query parameters for the conversation list, derived from the active
/// filter, search term, and page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub archived: bool,
    pub assigned_agent_id: Option<Uuid>,
    pub has_agent: Option<bool>,
    pub status: Option<ConversationState>,
    pub channel_id: Option<Uuid>,
}

// --- Templates ---

/// A reusable message template with `{{variable}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// JSON-encoded array of declared variable names, as stored by the
    /// backend.
    #[serde(default)]
    pub variables: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub usage_count: i64,
}

impl MessageTemplate {
    /// Declared variable names. An empty or malformed `variables` column
    /// yields no names rather than an error.
    pub fn variable_names(&self) -> Vec<String> {
        serde_json::from_str(&self.variables).unwrap_or_default()
    }

    /// Substitute `{{name}}` placeholders with the provided values.
    /// Placeholders without a value are left untouched.
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut out = self.content.clone();
        for (name, value) in values {
            let placeholder = format!("{{{{{name}}}}}");
            out = out.replace(&placeholder, value);
        }
        out
    }
}

// --- Import jobs ---

/// Lifecycle status of a bulk import job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    /// Terminal states stop the progress poller.
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

/// A bulk import job, treated as an opaque external state machine. Wire
/// names follow the progress endpoint's `*_items` convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub status: ImportStatus,
    #[serde(default, rename = "total_items")]
    pub total_records: u64,
    #[serde(default, rename = "processed_items")]
    pub processed_records: u64,
    #[serde(default, rename = "successful_items")]
    pub success_records: u64,
    #[serde(default, rename = "failed_items")]
    pub error_records: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ImportJob {
    /// Completion percentage: processed over total, 0 when nothing is
    /// declared yet.
    pub fn progress_percent(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (self.processed_records as f64 / self.total_records as f64) * 100.0
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_maps_to_channel_status() {
        assert_eq!(
            SessionState::Working.channel_status(),
            ChannelStatus::Connected
        );
        assert_eq!(
            SessionState::Starting.channel_status(),
            ChannelStatus::Connecting
        );
        for state in [
            SessionState::ScanQrCode,
            SessionState::Stopped,
            SessionState::Failed,
            SessionState::Unknown,
        ] {
            assert_eq!(state.channel_status(), ChannelStatus::Disconnected);
        }
    }

    #[test]
    fn session_state_parses_bridge_strings() {
        let state: SessionState = serde_json::from_str("\"SCAN_QR_CODE\"").unwrap();
        assert_eq!(state, SessionState::ScanQrCode);
        let state: SessionState = serde_json::from_str("\"WORKING\"").unwrap();
        assert_eq!(state, SessionState::Working);
        // Unrecognized bridge states fold into Unknown.
        let state: SessionState = serde_json::from_str("\"OPENING\"").unwrap();
        assert_eq!(state, SessionState::Unknown);
    }

    #[test]
    fn channel_session_presence() {
        let mut channel = Channel {
            id: Uuid::new_v4(),
            name: "main".into(),
            channel_type: "whatsapp".into(),
            session: "tenant-main".into(),
            status: ChannelStatus::Disconnected,
            is_active: true,
        };
        assert!(channel.has_session());
        channel.session = "   ".into();
        assert!(!channel.has_session());
        channel.session = String::new();
        assert!(!channel.has_session());
    }

    #[test]
    fn counts_deserialize_from_portuguese_keys() {
        let counts: ConversationCounts = serde_json::from_str(
            r#"{"novas": 4, "em_atendimento": 2, "minhas": 1, "arquivadas": 7}"#,
        )
        .unwrap();
        assert_eq!(counts.unassigned, 4);
        assert_eq!(counts.in_progress, 2);
        assert_eq!(counts.mine, 1);
        assert_eq!(counts.archived, 7);
    }

    #[test]
    fn page_accepts_both_generic_shapes() {
        let full: Page<i32> =
            serde_json::from_str(r#"{"data": [1, 2, 3], "total": 3, "page": 1, "limit": 20}"#)
                .unwrap();
        assert_eq!(full.items(), &[1, 2, 3]);
        assert_eq!(full.total(), 3);

        let per_page: Page<i32> =
            serde_json::from_str(r#"{"data": [9], "total": 1, "page": 1, "per_page": 20}"#)
                .unwrap();
        assert_eq!(per_page.items(), &[9]);

        let slim: Page<i32> = serde_json::from_str(r#"{"items": [5], "total": 1}"#).unwrap();
        assert_eq!(slim.into_items(), vec![5]);
    }

    #[test]
    fn assignment_update_serializes_explicit_null() {
        let json = serde_json::to_string(&AssignmentUpdate::unassign()).unwrap();
        assert_eq!(json, r#"{"assigned_agent_id":null}"#);

        let id = Uuid::new_v4();
        let json = serde_json::to_string(&AssignmentUpdate::assign(id)).unwrap();
        assert!(json.contains(&id.to_string()));
    }

    #[test]
    fn outbound_message_omits_empty_linkage() {
        let out = OutboundMessage::text(Uuid::new_v4(), "oi");
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("reply_to_id"));
        assert!(!json.contains("resend_message_id"));
        assert!(json.contains(r#""type":"text""#));
    }

    #[test]
    fn template_renders_placeholders() {
        let template = MessageTemplate {
            id: Uuid::new_v4(),
            title: "Boas-vindas".into(),
            content: "Olá {{nome}}, seu pedido {{pedido}} chegou. Obrigado, {{nome}}!".into(),
            variables: r#"["nome", "pedido"]"#.into(),
            category: String::new(),
            is_active: true,
            usage_count: 0,
        };
        assert_eq!(template.variable_names(), vec!["nome", "pedido"]);

        let mut values = HashMap::new();
        values.insert("nome".to_string(), "Ana".to_string());
        values.insert("pedido".to_string(), "#42".to_string());
        assert_eq!(
            template.render(&values),
            "Olá Ana, seu pedido #42 chegou. Obrigado, Ana!"
        );
    }

    #[test]
    fn template_leaves_unfilled_placeholders() {
        let template = MessageTemplate {
            id: Uuid::new_v4(),
            title: "t".into(),
            content: "Olá {{nome}}".into(),
            variables: String::new(),
            category: String::new(),
            is_active: true,
            usage_count: 0,
        };
        assert!(template.variable_names().is_empty());
        assert_eq!(template.render(&HashMap::new()), "Olá {{nome}}");
    }

    #[test]
    fn import_progress_percent() {
        let mut job = ImportJob {
            id: Uuid::new_v4(),
            status: ImportStatus::Processing,
            total_records: 200,
            processed_records: 50,
            success_records: 48,
            error_records: 2,
            error_message: None,
        };
        assert!((job.progress_percent() - 25.0).abs() < f64::EPSILON);

        job.total_records = 0;
        assert_eq!(job.progress_percent(), 0.0);
    }

    #[test]
    fn import_terminal_states() {
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
        assert!(!ImportStatus::Pending.is_terminal());
        assert!(!ImportStatus::Processing.is_terminal());
    }

    #[test]
    fn admin_roles_gate_delegation() {
        assert!(AgentRole::SystemAdmin.is_admin());
        assert!(AgentRole::TenantAdmin.is_admin());
        assert!(!AgentRole::TenantUser.is_admin());
    }

    #[test]
    fn conversation_tolerates_minimal_payload() {
        let conversation: Conversation = serde_json::from_str(&format!(
            r#"{{"id": "{}", "customer_id": "{}", "channel_id": "{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .unwrap();
        assert!(!conversation.is_archived);
        assert!(conversation.ai_enabled);
        assert_eq!(conversation.status, ConversationState::Open);
        assert!(!conversation.is_assigned());
    }
}
