// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the desk API.
//!
//! Provides [`HttpBackend`], the production implementation of
//! [`balcao_core::Backend`]. Handles bearer authentication, transient error
//! retry, and mapping of the desk's error conventions onto [`BalcaoError`].

use std::time::Duration;

use async_trait::async_trait;
use balcao_core::types::{
    Agent, AssignmentUpdate, Channel, ConversationCounts, ConversationDetail, ConversationPage,
    ConversationQuery, ImportJob, LoginSession, MediaAttachment, Message, MessageKind,
    MessageTemplate, OutboundMessage, Page, SessionStatus,
};
use balcao_core::{Backend, BalcaoError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::wire;

/// Connection tuning for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after a transient failure (429/5xx). Auth and client errors
    /// are never retried.
    pub retry_attempts: u32,
    /// Fixed delay before each retry.
    pub retry_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_attempts: 1,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// HTTP implementation of the desk [`Backend`].
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpBackend {
    /// Creates a new client for the desk API at `base_url`.
    ///
    /// `token` is attached as a bearer credential to every request; pass
    /// `None` only for unauthenticated calls such as login.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<&str>,
        options: &ClientOptions,
    ) -> Result<Self, BalcaoError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                BalcaoError::Config(format!("invalid API token header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|e| BalcaoError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            retry_attempts: options.retry_attempts,
            retry_delay: options.retry_delay,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request, retrying transient failures up to the configured
    /// attempt count with a fixed delay.
    ///
    /// Requests with streaming bodies (multipart uploads) cannot be
    /// replayed and get a single attempt.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BalcaoError> {
        let mut last_error = None;

        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                warn!(attempt, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let this_attempt = match request.try_clone() {
                Some(cloned) => cloned,
                None => {
                    let response = request.send().await.map_err(transport_error)?;
                    return classify(response).await;
                }
            };

            let response = this_attempt.send().await.map_err(transport_error)?;
            let status = response.status();
            debug!(status = %status, attempt, "response received");

            if is_transient(status) && attempt < self.retry_attempts {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, "transient error, will retry");
                last_error = Some(BalcaoError::Api {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                });
                continue;
            }

            return classify(response).await;
        }

        Err(last_error
            .unwrap_or_else(|| BalcaoError::Internal("request failed after retries".into())))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BalcaoError> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Sends a request and discards the response body. Used for endpoints
    /// that acknowledge with `{"message": ...}` only.
    async fn send_ack(&self, request: reqwest::RequestBuilder) -> Result<(), BalcaoError> {
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint("/auth/login"))
            .json(&wire::LoginRequest { email, password });
        self.send_json(request).await
    }

    async fn list_conversations(
        &self,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, BalcaoError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("archived", query.archived.to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(agent_id) = query.assigned_agent_id {
            params.push(("assigned_agent_id", agent_id.to_string()));
        }
        if let Some(has_agent) = query.has_agent {
            params.push(("has_agent", has_agent.to_string()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }
        if let Some(channel_id) = query.channel_id {
            params.push(("channel_id", channel_id.to_string()));
        }

        let request = self
            .client
            .get(self.endpoint("/whatsapp/conversations"))
            .query(&params);
        self.send_json(request).await
    }

    async fn conversation_detail(
        &self,
        conversation_id: Uuid,
        messages_limit: u32,
    ) -> Result<ConversationDetail, BalcaoError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}")))
            .query(&[("messages_limit", messages_limit.to_string())]);
        self.send_json(request).await
    }

    async fn mark_read(&self, conversation_id: Uuid) -> Result<(), BalcaoError> {
        let request = self
            .client
            .post(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}/read")));
        self.send_ack(request).await
    }

    async fn update_assignment(
        &self,
        conversation_id: Uuid,
        update: &AssignmentUpdate,
    ) -> Result<(), BalcaoError> {
        let request = self
            .client
            .put(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}")))
            .json(update);
        self.send_ack(request).await
    }

    async fn toggle_archive(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}/archive")));
        let toggled: wire::ArchiveToggle = self.send_json(request).await?;
        Ok(toggled.is_archived)
    }

    async fn toggle_pin(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}/pin")));
        let toggled: wire::PinToggle = self.send_json(request).await?;
        Ok(toggled.is_pinned)
    }

    async fn toggle_ai(&self, conversation_id: Uuid) -> Result<bool, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint(&format!("/whatsapp/conversations/{conversation_id}/toggle-ai")));
        let toggled: wire::AiToggle = self.send_json(request).await?;
        Ok(toggled.ai_enabled)
    }

    async fn send_message(&self, outbound: &OutboundMessage) -> Result<Message, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint("/whatsapp/send"))
            .json(outbound);
        self.send_json(request).await
    }

    async fn send_media(
        &self,
        conversation_id: Uuid,
        kind: MessageKind,
        attachment: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<(), BalcaoError> {
        let path = match kind {
            MessageKind::Image => "/whatsapp/send/image",
            MessageKind::Audio => "/whatsapp/send/audio",
            _ => "/whatsapp/send/document",
        };

        let body = wire::MediaSendRequest {
            file: wire::MediaFileRef {
                mimetype: &attachment.mimetype,
                filename: &attachment.filename,
                url: &attachment.url,
            },
            caption,
            conversation_id,
        };

        let request = self.client.post(self.endpoint(path)).json(&body);
        self.send_ack(request).await
    }

    async fn upload_media(
        &self,
        filename: &str,
        mimetype: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaAttachment, BalcaoError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mimetype)
            .map_err(|e| BalcaoError::Validation(format!("invalid media mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .client
            .post(self.endpoint("/whatsapp/upload/media"))
            .multipart(form);
        let uploaded: wire::UploadResponse = self.send_json(request).await?;

        Ok(MediaAttachment {
            url: uploaded.url,
            mimetype: mimetype.to_string(),
            filename: filename.to_string(),
        })
    }

    async fn create_note(
        &self,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Message, BalcaoError> {
        let request = self
            .client
            .post(self.endpoint("/messages/notes"))
            .json(&wire::NoteRequest {
                conversation_id,
                content,
            });
        self.send_json(request).await
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, BalcaoError> {
        let request = self.client.get(self.endpoint("/channels"));
        let page: Page<Channel> = self.send_json(request).await?;
        Ok(page.into_items())
    }

    async fn session_status(&self, channel_id: Uuid) -> Result<SessionStatus, BalcaoError> {
        let request = self
            .client
            .get(self.endpoint("/whatsapp/session-status"))
            .query(&[("channel_id", channel_id.to_string())]);
        self.send_json(request).await
    }

    async fn qr_code(&self, channel_id: Uuid) -> Result<Vec<u8>, BalcaoError> {
        let request = self
            .client
            .get(self.endpoint("/whatsapp/qr"))
            .query(&[("channel_id", channel_id.to_string())]);
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(|e| BalcaoError::Transport {
            message: format!("failed to read QR image body: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(bytes.to_vec())
    }

    async fn conversation_counts(&self) -> Result<ConversationCounts, BalcaoError> {
        let request = self.client.get(self.endpoint("/dashboard/conversation-counts"));
        self.send_json(request).await
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, BalcaoError> {
        let request = self
            .client
            .get(self.endpoint("/users"))
            .query(&[("limit", "100")]);
        let envelope: wire::AgentsEnvelope = self.send_json(request).await?;
        Ok(envelope.users)
    }

    async fn list_templates(&self) -> Result<Vec<MessageTemplate>, BalcaoError> {
        let request = self.client.get(self.endpoint("/message-templates"));
        let page: Page<MessageTemplate> = self.send_json(request).await?;
        Ok(page.into_items())
    }

    async fn create_import(&self, filename: &str, csv: Vec<u8>) -> Result<Uuid, BalcaoError> {
        let part = reqwest::multipart::Part::bytes(csv)
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .map_err(|e| BalcaoError::Validation(format!("invalid CSV mime type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .client
            .post(self.endpoint("/import/products"))
            .multipart(form);
        let accepted: wire::ImportAccepted = self.send_json(request).await?;
        Ok(accepted.job_id)
    }

    async fn import_progress(&self, job_id: Uuid) -> Result<ImportJob, BalcaoError> {
        let request = self
            .client
            .get(self.endpoint(&format!("/import/jobs/{job_id}/progress")));
        let envelope: wire::ImportProgressEnvelope = self.send_json(request).await?;
        Ok(envelope.job)
    }
}

fn transport_error(err: reqwest::Error) -> BalcaoError {
    BalcaoError::Transport {
        message: format!("HTTP request failed: {err}"),
        source: Some(Box::new(err)),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

/// Extract the desk's `{"error": "..."}` message, falling back to the raw
/// body or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<wire::ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Map a non-success response onto the error taxonomy: 401/403 are
/// terminal auth failures, 402 carries the credit shortfall, everything
/// else is a plain API error.
async fn classify(response: reqwest::Response) -> Result<reqwest::Response, BalcaoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    match code {
        401 | 403 => Err(BalcaoError::Unauthorized {
            status: code,
            message: error_message(status, &body),
        }),
        402 => {
            let credits: wire::CreditsBody = serde_json::from_str(&body).unwrap_or_default();
            Err(BalcaoError::InsufficientCredits {
                available: credits.available,
                required: credits.required,
            })
        }
        _ => Err(BalcaoError::Api {
            status: code,
            message: error_message(status, &body),
        }),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BalcaoError> {
    let body = response.text().await.map_err(|e| BalcaoError::Transport {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| BalcaoError::Decode {
        message: format!("failed to parse API response: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_backend(base_url: &str) -> HttpBackend {
        let options = ClientOptions {
            retry_delay: Duration::from_millis(10),
            ..ClientOptions::default()
        };
        HttpBackend::new(base_url, Some("test-token"), &options).unwrap()
    }

    fn conversation_json(id: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "customer_id": Uuid::new_v4(),
            "channel_id": Uuid::new_v4(),
            "is_pinned": false,
            "is_archived": false,
            "ai_enabled": true,
            "unread_count": 2
        })
    }

    fn message_json(conversation_id: Uuid) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "conversation_id": conversation_id,
            "type": "text",
            "content": "oi",
            "direction": "out",
            "status": "sent"
        })
    }

    #[tokio::test]
    async fn list_conversations_parses_envelope() {
        let server = MockServer::start().await;
        let body = json!({
            "conversations": [conversation_json(Uuid::new_v4())],
            "pagination": {"page": 1, "limit": 20, "total": 41, "total_pages": 3}
        });

        Mock::given(method("GET"))
            .and(path("/whatsapp/conversations"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "20"))
            .and(query_param("archived", "false"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let query = ConversationQuery {
            page: 1,
            limit: 20,
            ..ConversationQuery::default()
        };
        let page = backend.list_conversations(&query).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.pagination.total, 41);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn detail_retries_on_500_then_succeeds() {
        let server = MockServer::start().await;
        let conversation_id = Uuid::new_v4();
        let body = json!({
            "conversation": conversation_json(conversation_id),
            "messages": [message_json(conversation_id)]
        });

        Mock::given(method("GET"))
            .and(path(format!("/whatsapp/conversations/{conversation_id}")))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/whatsapp/conversations/{conversation_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let detail = backend.conversation_detail(conversation_id, 50).await.unwrap();
        assert_eq!(detail.conversation.id, conversation_id);
        assert_eq!(detail.messages.len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_is_terminal_and_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dashboard/conversation-counts"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let err = backend.conversation_counts().await.unwrap_err();
        assert!(err.is_auth());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("token expired"));
    }

    #[tokio::test]
    async fn payment_required_carries_credit_context() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/whatsapp/send"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": "Insufficient AI credits",
                "required": 10,
                "available": 3
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let outbound = OutboundMessage::text(Uuid::new_v4(), "oi");
        let err = backend.send_message(&outbound).await.unwrap_err();
        match err {
            BalcaoError::InsufficientCredits {
                available,
                required,
            } => {
                assert_eq!(available, 3);
                assert_eq!(required, 10);
            }
            other => panic!("expected InsufficientCredits, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn toggle_archive_returns_new_state() {
        let server = MockServer::start().await;
        let conversation_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path(format!(
                "/whatsapp/conversations/{conversation_id}/archive"
            )))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "is_archived": true})),
            )
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        assert!(backend.toggle_archive(conversation_id).await.unwrap());
    }

    #[tokio::test]
    async fn unassign_serializes_explicit_null() {
        let server = MockServer::start().await;
        let conversation_id = Uuid::new_v4();

        Mock::given(method("PUT"))
            .and(path(format!("/whatsapp/conversations/{conversation_id}")))
            .and(body_json(json!({"assigned_agent_id": null})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Conversation updated successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        backend
            .update_assignment(conversation_id, &AssignmentUpdate::unassign())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn qr_conflict_maps_to_api_error() {
        let server = MockServer::start().await;
        let channel_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/whatsapp/qr"))
            .and(query_param("channel_id", channel_id.to_string()))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "Session already connected",
                "status": "WORKING"
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let err = backend.qr_code(channel_id).await.unwrap_err();
        match err {
            BalcaoError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Session already connected");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_status_returns_raw_bridge_state() {
        let server = MockServer::start().await;
        let channel_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/whatsapp/session-status"))
            .and(query_param("channel_id", channel_id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "tenant-main",
                "status": "SCAN_QR_CODE"
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let status = backend.session_status(channel_id).await.unwrap();
        assert_eq!(
            status.status,
            balcao_core::types::SessionState::ScanQrCode
        );
    }

    #[tokio::test]
    async fn agents_list_unwraps_users_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{
                    "id": Uuid::new_v4(),
                    "name": "Ana",
                    "email": "ana@example.com",
                    "role": "tenant_admin",
                    "is_active": true
                }],
                "pagination": {"page": 1, "limit": 100, "total": 1, "pages": 1}
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let agents = backend.list_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "Ana");
        assert!(agents[0].is_admin());
    }

    #[tokio::test]
    async fn channels_list_accepts_paginated_data() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": Uuid::new_v4(),
                    "name": "main",
                    "type": "whatsapp",
                    "session": "tenant-main",
                    "status": "disconnected",
                    "is_active": true
                }],
                "total": 1,
                "page": 1,
                "per_page": 20,
                "total_pages": 1
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let channels = backend.list_channels().await.unwrap();
        assert_eq!(channels.len(), 1);
        assert!(channels[0].has_session());
    }

    #[tokio::test]
    async fn import_create_returns_job_id() {
        let server = MockServer::start().await;
        let job_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/import/products"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "job_id": job_id,
                "message": "Importação iniciada com sucesso"
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let created = backend
            .create_import("products.csv", b"name,price\n".to_vec())
            .await
            .unwrap();
        assert_eq!(created, job_id);
    }

    #[tokio::test]
    async fn import_progress_unwraps_job_envelope() {
        let server = MockServer::start().await;
        let job_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/import/jobs/{job_id}/progress")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job": {
                    "id": job_id,
                    "status": "processing",
                    "total_items": 100,
                    "processed_items": 40,
                    "successful_items": 39,
                    "failed_items": 1
                }
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let job = backend.import_progress(job_id).await.unwrap();
        assert_eq!(job.processed_records, 40);
        assert!((job.progress_percent() - 40.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn send_message_posts_typed_payload() {
        let server = MockServer::start().await;
        let conversation_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/whatsapp/send"))
            .and(body_json(json!({
                "conversation_id": conversation_id,
                "type": "text",
                "content": "oi"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_json(conversation_id)))
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let message = backend
            .send_message(&OutboundMessage::text(conversation_id, "oi"))
            .await
            .unwrap();
        assert_eq!(message.conversation_id, conversation_id);
        assert_eq!(message.status, balcao_core::types::MessageStatus::Sent);
    }
}
