// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for domain values used across integration tests.
//!
//! Every builder fills in the fields a test usually does not care about, so
//! tests construct only what they assert on.

use balcao_core::types::{
    Agent, AgentRole, Channel, ChannelStatus, Conversation, ConversationCounts,
    ConversationDetail, ConversationPage, ConversationState, Customer, Direction, ImportJob,
    ImportStatus, Message, MessageKind, MessageStatus, MessageTemplate, Pagination, SessionIdentity,
    SessionState, SessionStatus,
};
use chrono::Utc;
use uuid::Uuid;

pub fn agent(name: &str, role: AgentRole) -> Agent {
    Agent {
        id: Uuid::new_v4(),
        tenant_id: Some(Uuid::new_v4()),
        name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        role,
        is_active: true,
    }
}

pub fn channel(name: &str) -> Channel {
    Channel {
        id: Uuid::new_v4(),
        name: name.to_string(),
        channel_type: "whatsapp".to_string(),
        session: format!("tenant-{name}"),
        status: ChannelStatus::Disconnected,
        is_active: true,
    }
}

pub fn customer(name: &str) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: Some("+5511999990000".to_string()),
    }
}

/// An open, unassigned, AI-enabled conversation with one unread message.
pub fn conversation(id: Uuid) -> Conversation {
    Conversation {
        id,
        customer_id: Uuid::new_v4(),
        channel_id: Uuid::new_v4(),
        assigned_agent_id: None,
        status: ConversationState::Open,
        is_archived: false,
        is_pinned: false,
        ai_enabled: true,
        unread_count: 1,
        last_message: Some("oi".to_string()),
        last_message_at: Some(Utc::now()),
        created_at: Some(Utc::now()),
        customer: Some(customer("Maria")),
        channel: None,
        assigned_agent: None,
    }
}

pub fn assigned_conversation(id: Uuid, agent_id: Uuid) -> Conversation {
    Conversation {
        assigned_agent_id: Some(agent_id),
        ..conversation(id)
    }
}

pub fn text_message(conversation_id: Uuid, direction: Direction, content: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id,
        customer_id: None,
        user_id: None,
        user_name: String::new(),
        kind: MessageKind::Text,
        content: content.to_string(),
        direction,
        status: MessageStatus::Sent,
        external_id: String::new(),
        media_url: None,
        media_type: None,
        filename: None,
        is_note: false,
        reply_to_id: None,
        created_at: Some(Utc::now()),
    }
}

pub fn detail(conversation: Conversation, messages: Vec<Message>) -> ConversationDetail {
    ConversationDetail {
        conversation,
        messages,
    }
}

/// A single-page listing of the given conversations.
pub fn page(conversations: Vec<Conversation>) -> ConversationPage {
    let total = conversations.len() as u64;
    ConversationPage {
        conversations,
        pagination: Pagination {
            page: 1,
            limit: 20,
            total,
            total_pages: u64::from(total > 0),
        },
    }
}

pub fn counts(unassigned: u64, in_progress: u64, mine: u64, archived: u64) -> ConversationCounts {
    ConversationCounts {
        unassigned,
        in_progress,
        mine,
        archived,
    }
}

pub fn session(state: SessionState) -> SessionStatus {
    SessionStatus {
        name: Some("tenant-main".to_string()),
        status: state,
        me: match state {
            SessionState::Working => Some(SessionIdentity {
                id: Some("5511999990000@c.us".to_string()),
                push_name: Some("Loja".to_string()),
            }),
            _ => None,
        },
    }
}

pub fn import_job(id: Uuid, status: ImportStatus, processed: u64, total: u64) -> ImportJob {
    ImportJob {
        id,
        status,
        total_records: total,
        processed_records: processed,
        success_records: processed,
        error_records: 0,
        error_message: None,
    }
}

pub fn template(title: &str, content: &str) -> MessageTemplate {
    MessageTemplate {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.to_string(),
        variables: "[]".to_string(),
        category: "geral".to_string(),
        is_active: true,
        usage_count: 0,
    }
}
