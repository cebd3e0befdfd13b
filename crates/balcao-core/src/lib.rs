// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the balcao conversation desk.
//!
//! This crate provides the domain types, error definitions, and the backend
//! trait used throughout the balcao workspace. The sync engines and the CLI
//! depend on the `Backend` seam defined here rather than on any concrete
//! HTTP client.

pub mod backend;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use backend::Backend;
pub use error::BalcaoError;
pub use types::{
    Agent, AgentRole, AssignmentUpdate, Channel, ChannelStatus, Conversation, ConversationCounts,
    ConversationDetail, ConversationPage, ConversationQuery, ConversationState, Customer,
    Direction, ImportJob, ImportStatus, LoginSession, MediaAttachment, Message, MessageKind,
    MessageStatus, MessageTemplate, OutboundMessage, Page, Pagination, SessionIdentity,
    SessionState, SessionStatus,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balcao_error_has_all_variants() {
        // Verify all 8 error variants exist and can be constructed.
        let _config = BalcaoError::Config("test".into());
        let _validation = BalcaoError::Validation("test".into());
        let _api = BalcaoError::Api {
            status: 500,
            message: "test".into(),
        };
        let _auth = BalcaoError::Unauthorized {
            status: 401,
            message: "test".into(),
        };
        let _credits = BalcaoError::InsufficientCredits {
            available: 0,
            required: 10,
        };
        let _transport = BalcaoError::Transport {
            message: "test".into(),
            source: None,
        };
        let _decode = BalcaoError::Decode {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _internal = BalcaoError::Internal("test".into());
    }

    #[test]
    fn wire_enums_round_trip() {
        use std::str::FromStr;

        for status in [
            MessageStatus::Sending,
            MessageStatus::Sent,
            MessageStatus::Delivered,
            MessageStatus::Read,
            MessageStatus::Failed,
        ] {
            let s = status.to_string();
            let parsed = MessageStatus::from_str(&s).expect("should parse back");
            assert_eq!(status, parsed);
        }

        for kind in [
            MessageKind::Text,
            MessageKind::Image,
            MessageKind::Audio,
            MessageKind::Video,
            MessageKind::Document,
        ] {
            let s = kind.to_string();
            let parsed = MessageKind::from_str(&s).expect("should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn backend_trait_is_object_safe() {
        // The engines hold the backend as Arc<dyn Backend>; this won't
        // compile if the trait loses object safety.
        fn _assert_object_safe(_: &dyn Backend) {}
    }
}
