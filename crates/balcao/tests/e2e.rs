// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Balcao pipeline.
//!
//! Each test spins up an isolated wiremock server and drives the real
//! engine, watchers, and HTTP backend against it. Tests are independent
//! and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use balcao_api::{ClientOptions, HttpBackend};
use balcao_bridge::{QrWatcher, WatcherEvent};
use balcao_config::model::{BridgeConfig, ImportConfig, InboxConfig};
use balcao_core::types::{AgentRole, ChannelStatus, ImportStatus, SessionState};
use balcao_core::Backend;
use balcao_import::{ImportEvent, ImportWatcher};
use balcao_inbox::{EngineUpdate, InboxEngine, MutationKind};
use balcao_test_utils::fixtures;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_options() -> ClientOptions {
    ClientOptions {
        timeout: Duration::from_secs(5),
        retry_attempts: 0,
        retry_delay: Duration::from_millis(10),
    }
}

fn inbox_config() -> InboxConfig {
    InboxConfig {
        page_size: 20,
        messages_limit: 50,
        search_debounce_ms: 30,
    }
}

fn http_backend(server: &MockServer) -> Arc<dyn Backend> {
    Arc::new(HttpBackend::new(server.uri(), Some("test-token"), &fast_options()).unwrap())
}

fn http_engine(server: &MockServer) -> InboxEngine {
    InboxEngine::new(
        http_backend(server),
        fixtures::agent("Ana", AgentRole::TenantUser),
        &inbox_config(),
    )
}

fn conversation_json(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "customer_id": Uuid::new_v4(),
        "channel_id": Uuid::new_v4(),
        "is_pinned": false,
        "is_archived": false,
        "ai_enabled": true,
        "unread_count": 1
    })
}

fn page_json(conversations: Vec<serde_json::Value>) -> serde_json::Value {
    let total = conversations.len();
    json!({
        "conversations": conversations,
        "pagination": {"page": 1, "limit": 20, "total": total, "total_pages": 1}
    })
}

fn detail_json(conversation_id: Uuid) -> serde_json::Value {
    json!({
        "conversation": conversation_json(conversation_id),
        "messages": []
    })
}

async fn mount_detail_and_read(server: &MockServer, conversation_id: Uuid) {
    Mock::given(method("GET"))
        .and(path(format!("/whatsapp/conversations/{conversation_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_json(conversation_id)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/whatsapp/conversations/{conversation_id}/read"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(server)
        .await;
}

/// Pumps the engine until a mutation of `kind` settles, returning its
/// error, if any. Other settles along the way are dropped.
async fn settle(engine: &mut InboxEngine, kind: MutationKind) -> Option<String> {
    loop {
        let update = tokio::time::timeout(Duration::from_secs(2), engine.next_update())
            .await
            .expect("timed out waiting for a settle")
            .expect("engine update failed");
        if let EngineUpdate::MutationSettled {
            kind: settled,
            error,
            ..
        } = update
        {
            if settled == kind {
                return error;
            }
        }
    }
}

// ---- Test 1: List pipeline over HTTP ----

#[tokio::test]
async fn list_fetches_once_and_serves_repeats_from_cache() {
    let server = MockServer::start().await;
    let body = page_json(vec![
        conversation_json(Uuid::new_v4()),
        conversation_json(Uuid::new_v4()),
    ]);

    // The default category is unassigned: never archived, no agent.
    Mock::given(method("GET"))
        .and(path("/whatsapp/conversations"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .and(query_param("archived", "false"))
        .and(query_param("has_agent", "false"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    let page = engine.list().await.unwrap();
    assert_eq!(page.conversations.len(), 2);

    // Second read is served from the cache; the mock's expect(1) verifies
    // no second request went out.
    let page = engine.list().await.unwrap();
    assert_eq!(page.conversations.len(), 2);
}

// ---- Test 2: Debounced search sends only the final term ----

#[tokio::test]
async fn rapid_typing_commits_one_request_with_the_final_term() {
    let server = MockServer::start().await;

    // Only the settled term may reach the wire. Intermediate keystrokes
    // have no mock; a stray request would 404 and fail the commit.
    Mock::given(method("GET"))
        .and(path("/whatsapp/conversations"))
        .and(query_param("search", "maria"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_json(vec![conversation_json(
                Uuid::new_v4(),
            )])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    engine.type_search("m");
    engine.type_search("ma");
    engine.type_search("maria");

    let update = tokio::time::timeout(Duration::from_secs(2), engine.next_update())
        .await
        .expect("timed out waiting for the search commit")
        .unwrap();
    assert_eq!(
        update,
        EngineUpdate::SearchApplied {
            term: Some("maria".to_string())
        }
    );
    assert_eq!(engine.search_term(), Some("maria"));
    assert_eq!(engine.list().await.unwrap().conversations.len(), 1);
}

// ---- Test 3: Optimistic send settles with the server message ----

#[tokio::test]
async fn sent_draft_records_the_server_id_on_settle() {
    let server = MockServer::start().await;
    let conversation_id = Uuid::new_v4();
    let server_id = Uuid::new_v4();
    mount_detail_and_read(&server, conversation_id).await;

    Mock::given(method("POST"))
        .and(path("/whatsapp/send"))
        .and(body_json(json!({
            "conversation_id": conversation_id,
            "type": "text",
            "content": "bom dia"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": server_id,
            "conversation_id": conversation_id,
            "type": "text",
            "content": "bom dia",
            "direction": "out",
            "status": "sent"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    engine.select(conversation_id).await.unwrap();
    engine.set_draft("bom dia");
    engine.send_draft().unwrap();

    // The draft cleared optimistically, before the settle.
    assert_eq!(engine.draft(), "");

    let error = settle(&mut engine, MutationKind::SendMessage).await;
    assert_eq!(error, None);

    let entries = engine.outbox_for(conversation_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].server_id, Some(server_id));
}

// ---- Test 4: Failed send is kept for explicit resend ----

#[tokio::test]
async fn failed_send_recovers_through_resend() {
    let server = MockServer::start().await;
    let conversation_id = Uuid::new_v4();
    mount_detail_and_read(&server, conversation_id).await;

    // First attempt hits an unavailable bridge; the retry succeeds.
    Mock::given(method("POST"))
        .and(path("/whatsapp/send"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"error": "bridge offline"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/whatsapp/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": Uuid::new_v4(),
            "conversation_id": conversation_id,
            "type": "text",
            "content": "oi",
            "direction": "out",
            "status": "sent"
        })))
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    engine.select(conversation_id).await.unwrap();
    engine.set_draft("oi");
    let local_id = engine.send_draft().unwrap();

    let error = settle(&mut engine, MutationKind::SendMessage).await;
    assert!(error.as_deref().unwrap_or("").contains("bridge offline"));

    let entries = engine.outbox_for(conversation_id);
    assert_eq!(entries[0].status, balcao_core::types::MessageStatus::Failed);

    engine.resend(local_id).unwrap();
    let error = settle(&mut engine, MutationKind::SendMessage).await;
    assert_eq!(error, None);

    let entries = engine.outbox_for(conversation_id);
    assert_eq!(entries[0].status, balcao_core::types::MessageStatus::Sent);
}

// ---- Test 5: Counts decode the backend's category keys ----

#[tokio::test]
async fn counts_map_portuguese_wire_keys_onto_categories() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/conversation-counts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "novas": 4,
            "em_atendimento": 2,
            "minhas": 1,
            "arquivadas": 9
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    let counts = engine.counts().await.unwrap();
    assert_eq!(counts.unassigned, 4);
    assert_eq!(counts.in_progress, 2);
    assert_eq!(counts.mine, 1);
    assert_eq!(counts.archived, 9);

    // Cached on repeat; expect(1) verifies.
    engine.counts().await.unwrap();
}

// ---- Test 6: Expired token is terminal ----

#[tokio::test]
async fn expired_token_surfaces_as_auth_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whatsapp/conversations"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = http_engine(&server);
    let err = engine.list().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("token expired"));
}

// ---- Test 7: QR pairing flow over HTTP ----

#[tokio::test]
async fn qr_pairing_completes_against_the_bridge_endpoints() {
    let server = MockServer::start().await;
    let channel_id = Uuid::new_v4();
    let png = vec![0x89, b'P', b'N', b'G'];

    Mock::given(method("GET"))
        .and(path("/whatsapp/qr"))
        .and(query_param("channel_id", channel_id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png.clone())
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    // Two polls still waiting for the scan, then the session is live.
    Mock::given(method("GET"))
        .and(path("/whatsapp/session-status"))
        .and(query_param("channel_id", channel_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "tenant-main",
            "status": "SCAN_QR_CODE"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/whatsapp/session-status"))
        .and(query_param("channel_id", channel_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "tenant-main",
            "status": "WORKING",
            "me": {"id": "5511999990000@c.us", "pushName": "Loja"}
        })))
        .mount(&server)
        .await;

    let config = BridgeConfig {
        poll_interval_ms: 20,
        connected_refresh_delay_ms: 10,
        notice_auto_close_secs: 0,
        refresh_interval_secs: 5,
    };
    let (watcher, mut rx) = QrWatcher::open(http_backend(&server), channel_id, &config);

    match rx.recv().await {
        Some(WatcherEvent::Qr(bytes)) => assert_eq!(bytes, png),
        other => panic!("expected qr first, got {other:?}"),
    }
    assert_eq!(
        rx.recv().await,
        Some(WatcherEvent::Status {
            session: SessionState::ScanQrCode,
            channel: ChannelStatus::Disconnected,
        })
    );
    assert_eq!(
        rx.recv().await,
        Some(WatcherEvent::Status {
            session: SessionState::Working,
            channel: ChannelStatus::Connected,
        })
    );
    assert_eq!(rx.recv().await, Some(WatcherEvent::Connected));
    assert_eq!(rx.recv().await, Some(WatcherEvent::RefreshChannels));
    assert_eq!(rx.recv().await, Some(WatcherEvent::Closed));
    assert_eq!(rx.recv().await, None);
    assert!(!watcher.is_open());
}

// ---- Test 8: Import upload and progress polling ----

#[tokio::test]
async fn import_upload_is_followed_to_completion() {
    let server = MockServer::start().await;
    let job_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/import/products"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "job_id": job_id,
            "message": "Importação iniciada com sucesso"
        })))
        .expect(1)
        .mount(&server)
        .await;

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
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/import/jobs/{job_id}/progress")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": {
                "id": job_id,
                "status": "completed",
                "total_items": 100,
                "processed_items": 100,
                "successful_items": 99,
                "failed_items": 1
            }
        })))
        .mount(&server)
        .await;

    let backend = http_backend(&server);
    let created = backend
        .create_import("produtos.csv", b"nome,preco\nCamiseta,49.90\n".to_vec())
        .await
        .unwrap();
    assert_eq!(created, job_id);

    let config = ImportConfig {
        poll_interval_ms: 20,
    };
    let (_watcher, mut rx) = ImportWatcher::watch(backend, created, &config);

    match rx.recv().await {
        Some(ImportEvent::Progress(job)) => {
            assert_eq!(job.status, ImportStatus::Processing);
            assert_eq!(job.processed_records, 40);
        }
        other => panic!("expected progress, got {other:?}"),
    }
    match rx.recv().await {
        Some(ImportEvent::Finished(job)) => {
            assert_eq!(job.status, ImportStatus::Completed);
            assert_eq!(job.success_records, 99);
            assert_eq!(job.error_records, 1);
        }
        other => panic!("expected finished, got {other:?}"),
    }
    assert!(rx.recv().await.is_none());
}

// ---- Test 9: Login round-trip ----

#[tokio::test]
async fn login_returns_the_session_and_operator_identity() {
    let server = MockServer::start().await;
    let agent_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "ana@example.com",
            "password": "s3nha"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-token",
            "refresh_token": "refresh-token",
            "expires_in": 3600,
            "user": {
                "id": agent_id,
                "tenant_id": tenant_id,
                "name": "Ana",
                "email": "ana@example.com",
                "role": "tenant_admin",
                "is_active": true
            }
        })))
        .mount(&server)
        .await;

    // Login goes out without a bearer header.
    let backend: Arc<dyn Backend> =
        Arc::new(HttpBackend::new(server.uri(), None, &fast_options()).unwrap());
    let session = backend.login("ana@example.com", "s3nha").await.unwrap();

    assert_eq!(session.access_token, "jwt-token");
    assert_eq!(session.agent.id, agent_id);
    assert_eq!(session.agent.name, "Ana");
    assert!(session.agent.is_admin());
}
