// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the balcao conversation desk.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level balcao configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BalcaoConfig {
    /// Desk API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Conversation inbox cache settings.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// WhatsApp bridge session polling settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Bulk import polling settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Desk API connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the desk API, including the version prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for API authentication. `None` falls back to the saved
    /// login session.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of retries after a transient failure (429 or 5xx). Auth and
    /// client errors are never retried.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between a transient failure and its retry, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Conversation inbox cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboxConfig {
    /// Conversations per list page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Messages loaded per conversation detail fetch. The backend caps this
    /// at 100.
    #[serde(default = "default_messages_limit")]
    pub messages_limit: u32,

    /// Quiet period after the last keystroke before a search term commits,
    /// in milliseconds.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            messages_limit: default_messages_limit(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_messages_limit() -> u32 {
    50
}

fn default_search_debounce_ms() -> u64 {
    500
}

/// WhatsApp bridge session polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Interval between session status polls while a pairing is in
    /// progress, in milliseconds.
    #[serde(default = "default_bridge_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay between the connected transition and the follow-up channel
    /// refresh, in milliseconds.
    #[serde(default = "default_connected_refresh_delay_ms")]
    pub connected_refresh_delay_ms: u64,

    /// Seconds the connected notice stays up before dismissing itself.
    #[serde(default = "default_notice_auto_close_secs")]
    pub notice_auto_close_secs: u64,

    /// Interval between channel list refreshes while a channels view is
    /// open, in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_bridge_poll_interval_ms(),
            connected_refresh_delay_ms: default_connected_refresh_delay_ms(),
            notice_auto_close_secs: default_notice_auto_close_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_bridge_poll_interval_ms() -> u64 {
    3000
}

fn default_connected_refresh_delay_ms() -> u64 {
    1000
}

fn default_notice_auto_close_secs() -> u64 {
    3
}

fn default_refresh_interval_secs() -> u64 {
    5
}

/// Bulk import polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Interval between import progress polls, in milliseconds.
    #[serde(default = "default_import_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_import_poll_interval_ms(),
        }
    }
}

fn default_import_poll_interval_ms() -> u64 {
    2000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "pretty" for humans, "json" for collectors.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
