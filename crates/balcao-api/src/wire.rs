// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response payloads specific to individual desk API endpoints.
//!
//! Shapes that outlive a single endpoint live in `balcao_core::types`; the
//! structs here exist only to match one handler's JSON.

use balcao_core::types::{Agent, ImportJob};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard error body: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 402 payload carrying the credit shortfall. Some handlers omit the
/// numbers, so both default to zero.
#[derive(Debug, Default, Deserialize)]
pub struct CreditsBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub available: i64,
    #[serde(default)]
    pub required: i64,
}

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Archive toggle response: `{"success": true, "is_archived": bool}`.
#[derive(Debug, Deserialize)]
pub struct ArchiveToggle {
    pub is_archived: bool,
}

/// Pin toggle response.
#[derive(Debug, Deserialize)]
pub struct PinToggle {
    pub is_pinned: bool,
}

/// AI toggle response.
#[derive(Debug, Deserialize)]
pub struct AiToggle {
    pub ai_enabled: bool,
}

/// Media upload response: `{"url": "...", "messageId": "..."}`.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Reference to an uploaded media file inside a media send request.
#[derive(Debug, Serialize)]
pub struct MediaFileRef<'a> {
    pub mimetype: &'a str,
    pub filename: &'a str,
    pub url: &'a str,
}

/// Media send request body shared by the image, document, and audio
/// endpoints.
#[derive(Debug, Serialize)]
pub struct MediaSendRequest<'a> {
    pub file: MediaFileRef<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
    pub conversation_id: Uuid,
}

/// Internal note creation body.
#[derive(Debug, Serialize)]
pub struct NoteRequest<'a> {
    pub conversation_id: Uuid,
    pub content: &'a str,
}

/// The tenant users listing wraps its page under a `users` key.
#[derive(Debug, Deserialize)]
pub struct AgentsEnvelope {
    #[serde(default)]
    pub users: Vec<Agent>,
}

/// 202 response from the import creation endpoint.
#[derive(Debug, Deserialize)]
pub struct ImportAccepted {
    pub job_id: Uuid,
}

/// The import progress endpoint wraps the job under a `job` key.
#[derive(Debug, Deserialize)]
pub struct ImportProgressEnvelope {
    pub job: ImportJob,
}
