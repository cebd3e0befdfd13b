// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the balcao conversation desk client.

use thiserror::Error;

/// The primary error type used across the backend seam and all desk operations.
#[derive(Debug, Error)]
pub enum BalcaoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Client-side validation failures raised before any network call
    /// (empty message body, unfilled template variable, bad argument).
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend rejected a request. `message` carries the server's
    /// `message`/`error` body field verbatim when one was present.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication or authorization failure (HTTP 401/403).
    /// Terminal: never retried.
    #[error("authentication rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// AI credit exhaustion (HTTP 402) with the server's numeric context.
    #[error("insufficient ai credits: {available} available, {required} required")]
    InsufficientCredits { available: i64, required: i64 },

    /// Network-level failures (connect, timeout, TLS, body read).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Response payloads that did not match the expected wire shape.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BalcaoError {
    /// Whether this error is a terminal auth rejection (401/403).
    pub fn is_auth(&self) -> bool {
        matches!(self, BalcaoError::Unauthorized { .. })
    }

    /// Whether the failed action can sensibly be retried by the user
    /// from the same control (everything except auth rejection).
    pub fn is_retryable(&self) -> bool {
        !self.is_auth()
    }
}
