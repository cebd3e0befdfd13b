// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message composer: draft text and the optimistic outbox.
//!
//! Sending clears the draft before the request resolves. The outbox entry
//! then tracks the attempt: `sending` until the server answers, `sent` on
//! acceptance, `failed` with a reason otherwise. Failed entries stay until
//! resent, so a send can never silently disappear.

use std::collections::HashMap;

use balcao_core::types::{Message, MessageKind, MessageStatus, MessageTemplate, OutboundMessage};
use balcao_core::BalcaoError;
use uuid::Uuid;

/// One optimistic send attempt.
#[derive(Debug, Clone)]
pub struct OutboundEntry {
    /// Client-side id, stable across resends.
    pub local_id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    pub status: MessageStatus,
    /// Server id of the persisted message, once known. Resends reference it.
    pub server_id: Option<Uuid>,
    /// Failure reason for `failed` entries.
    pub error: Option<String>,
}

/// Draft text plus the outbox of in-flight and failed sends.
#[derive(Default)]
pub struct Composer {
    draft: String,
    outbox: Vec<OutboundEntry>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    /// Replaces the draft with the rendered template.
    ///
    /// Every variable the template declares must have a value; missing ones
    /// fail validation before anything is touched.
    pub fn apply_template(
        &mut self,
        template: &MessageTemplate,
        values: &HashMap<String, String>,
    ) -> Result<(), BalcaoError> {
        let missing: Vec<String> = template
            .variable_names()
            .into_iter()
            .filter(|name| !values.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(BalcaoError::Validation(format!(
                "missing template variables: {}",
                missing.join(", ")
            )));
        }
        self.draft = template.render(values);
        Ok(())
    }

    /// Starts a send: validates the draft, creates a `sending` outbox entry,
    /// and clears the draft optimistically.
    ///
    /// Returns the entry's local id and the payload to dispatch.
    pub fn begin_send(
        &mut self,
        conversation_id: Uuid,
    ) -> Result<(Uuid, OutboundMessage), BalcaoError> {
        let content = self.draft.trim().to_string();
        if content.is_empty() {
            return Err(BalcaoError::Validation(
                "message content is empty".to_string(),
            ));
        }

        let local_id = Uuid::new_v4();
        self.outbox.push(OutboundEntry {
            local_id,
            conversation_id,
            content: content.clone(),
            status: MessageStatus::Sending,
            server_id: None,
            error: None,
        });
        self.draft.clear();

        Ok((local_id, OutboundMessage::text(conversation_id, content)))
    }

    /// Re-dispatches a failed entry, flipping it back to `sending`.
    ///
    /// When the failed message was persisted server-side, the payload
    /// references it so the backend re-drives that message instead of
    /// creating a duplicate.
    pub fn begin_resend(&mut self, local_id: Uuid) -> Result<OutboundMessage, BalcaoError> {
        let entry = self
            .outbox
            .iter_mut()
            .find(|e| e.local_id == local_id)
            .ok_or_else(|| {
                BalcaoError::Validation(format!("no outbox entry {local_id} to resend"))
            })?;
        if entry.status != MessageStatus::Failed {
            return Err(BalcaoError::Validation(format!(
                "outbox entry {local_id} is {}, only failed sends can be resent",
                entry.status
            )));
        }

        entry.status = MessageStatus::Sending;
        entry.error = None;

        Ok(OutboundMessage {
            conversation_id: entry.conversation_id,
            kind: MessageKind::Text,
            content: entry.content.clone(),
            reply_to_id: None,
            resend_message_id: entry.server_id.map(|id| id.to_string()),
        })
    }

    /// Settles a send attempt with the backend's answer. The entry adopts
    /// the persisted message's status on success and goes to `failed` with
    /// the error text otherwise; it never stays `sending`.
    pub fn resolve_send(&mut self, local_id: Uuid, result: Result<Message, BalcaoError>) {
        let Some(entry) = self.outbox.iter_mut().find(|e| e.local_id == local_id) else {
            return;
        };
        match result {
            Ok(message) => {
                entry.server_id = Some(message.id);
                entry.status = message.status;
                if message.status == MessageStatus::Failed {
                    entry.error = Some("message rejected by the messaging bridge".to_string());
                }
            }
            Err(error) => {
                entry.status = MessageStatus::Failed;
                entry.error = Some(error.to_string());
            }
        }
    }

    pub fn entry(&self, local_id: Uuid) -> Option<&OutboundEntry> {
        self.outbox.iter().find(|e| e.local_id == local_id)
    }

    pub fn outbox(&self) -> &[OutboundEntry] {
        &self.outbox
    }

    /// Outbox entries for one conversation, oldest first.
    pub fn outbox_for(&self, conversation_id: Uuid) -> Vec<&OutboundEntry> {
        self.outbox
            .iter()
            .filter(|e| e.conversation_id == conversation_id)
            .collect()
    }

    /// Drops delivered entries; the refetched detail now contains them.
    /// Failed and in-flight entries stay.
    pub fn prune_delivered(&mut self) {
        self.outbox.retain(|e| {
            matches!(e.status, MessageStatus::Sending | MessageStatus::Failed)
        });
    }
}
