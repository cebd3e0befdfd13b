// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao send` command implementation.
//!
//! One-shot send to a conversation: text straight to the message endpoint,
//! or a file through upload-then-send. The interactive inbox owns drafts
//! and resends; a single-shot process has nothing to keep, so this talks
//! to the backend directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use balcao_core::types::{MessageKind, MessageStatus, OutboundMessage};
use balcao_core::{Backend, BalcaoError};
use colored::Colorize;
use uuid::Uuid;

/// Run the `balcao send` command.
pub async fn run_send(
    backend: Arc<dyn Backend>,
    conversation_id: Uuid,
    message: Option<String>,
    file: Option<PathBuf>,
    caption: Option<String>,
) -> Result<(), BalcaoError> {
    match (message, file) {
        (Some(_), Some(_)) => Err(BalcaoError::Validation(
            "pass either a message or --file, not both".to_string(),
        )),
        (None, None) => Err(BalcaoError::Validation(
            "nothing to send; pass a message or --file".to_string(),
        )),
        (Some(text), None) => send_text(backend, conversation_id, &text).await,
        (None, Some(path)) => send_file(backend, conversation_id, &path, caption).await,
    }
}

async fn send_text(
    backend: Arc<dyn Backend>,
    conversation_id: Uuid,
    text: &str,
) -> Result<(), BalcaoError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BalcaoError::Validation("message is empty".to_string()));
    }

    let outbound = OutboundMessage::text(conversation_id, text);
    let message = backend.send_message(&outbound).await?;

    // The server stores the message even when the bridge rejects it; the
    // inbox can resend it later.
    if message.status == MessageStatus::Failed {
        println!(
            "{} message stored but not delivered; resend it from the inbox",
            "!".yellow()
        );
    } else {
        println!("{} message sent", "✓".green());
    }
    Ok(())
}

async fn send_file(
    backend: Arc<dyn Backend>,
    conversation_id: Uuid,
    path: &Path,
    caption: Option<String>,
) -> Result<(), BalcaoError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BalcaoError::Validation(format!("cannot read {}: {e}", path.display())))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BalcaoError::Validation(format!("{} has no file name", path.display()))
        })?;

    let (kind, mimetype) = media_kind(&filename);
    println!("uploading {filename} ({} bytes)", bytes.len());

    let attachment = backend.upload_media(&filename, mimetype, bytes).await?;
    backend
        .send_media(conversation_id, kind, &attachment, caption.as_deref())
        .await?;

    println!("{} {kind} sent", "✓".green());
    Ok(())
}

/// Maps a filename to the media kind and mimetype the bridge expects.
/// Unknown extensions go out as documents.
fn media_kind(filename: &str) -> (MessageKind, &'static str) {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_ascii_lowercase().to_string_lossy().into_owned())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => (MessageKind::Image, "image/jpeg"),
        "png" => (MessageKind::Image, "image/png"),
        "webp" => (MessageKind::Image, "image/webp"),
        "gif" => (MessageKind::Image, "image/gif"),
        "mp3" => (MessageKind::Audio, "audio/mpeg"),
        "ogg" | "opus" => (MessageKind::Audio, "audio/ogg"),
        "wav" => (MessageKind::Audio, "audio/wav"),
        "mp4" => (MessageKind::Video, "video/mp4"),
        "webm" => (MessageKind::Video, "video/webm"),
        "pdf" => (MessageKind::Document, "application/pdf"),
        "csv" => (MessageKind::Document, "text/csv"),
        _ => (MessageKind::Document, "application/octet-stream"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balcao_test_utils::mock_backend::{BackendCall, CallKind, MockBackend};

    #[tokio::test]
    async fn text_goes_straight_to_the_message_endpoint() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let conversation_id = Uuid::new_v4();

        run_send(
            backend,
            conversation_id,
            Some("  bom dia  ".to_string()),
            None,
            None,
        )
        .await
        .unwrap();

        let calls = mock.calls().await;
        assert_eq!(
            calls,
            vec![BackendCall::SendMessage {
                conversation_id,
                content: "bom dia".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn file_uploads_then_sends_media() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recibo.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let conversation_id = Uuid::new_v4();

        run_send(backend, conversation_id, None, Some(path), None)
            .await
            .unwrap();

        assert_eq!(mock.call_count(CallKind::UploadMedia).await, 1);
        assert_eq!(mock.call_count(CallKind::SendMedia).await, 1);
        let calls = mock.calls().await;
        assert!(matches!(
            &calls[1],
            BackendCall::SendMedia { kind: MessageKind::Document, .. }
        ));
    }

    #[tokio::test]
    async fn text_and_file_together_are_rejected_without_a_request() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();

        let err = run_send(
            backend,
            Uuid::new_v4(),
            Some("oi".to_string()),
            Some(PathBuf::from("foto.png")),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BalcaoError::Validation(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();

        let err = run_send(backend, Uuid::new_v4(), Some("   ".to_string()), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::Validation(_)));
    }

    #[test]
    fn media_kind_follows_the_extension() {
        assert_eq!(media_kind("foto.JPG").0, MessageKind::Image);
        assert_eq!(media_kind("nota.ogg").0, MessageKind::Audio);
        assert_eq!(media_kind("video.mp4").0, MessageKind::Video);
        assert_eq!(media_kind("recibo.pdf").0, MessageKind::Document);
        assert_eq!(media_kind("sem-extensao").0, MessageKind::Document);
        assert_eq!(media_kind("sem-extensao").1, "application/octet-stream");
    }
}
