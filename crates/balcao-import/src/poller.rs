// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Import job progress watcher.
//!
//! A bulk import runs server-side as an opaque job in `pending →
//! processing → completed | failed`. The watcher polls the progress
//! endpoint at a fixed interval, streams each snapshot to the consumer,
//! and ends itself on the first terminal status. Poll failures are
//! reported inline; the job keeps running server-side regardless, so the
//! next tick simply asks again.

use std::sync::Arc;
use std::time::Duration;

use balcao_config::model::ImportConfig;
use balcao_core::types::ImportJob;
use balcao_core::Backend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Progress stream for one import job.
#[derive(Debug, Clone)]
pub enum ImportEvent {
    /// A non-terminal snapshot.
    Progress(ImportJob),
    /// The terminal snapshot; the watcher has stopped.
    Finished(ImportJob),
    /// A progress poll failed. Transient; polling continues.
    PollError(String),
}

/// Handle to a running import watch. Dropping it stops the polling.
pub struct ImportWatcher {
    job_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ImportWatcher {
    /// Starts polling the job. The first poll happens immediately.
    pub fn watch(
        backend: Arc<dyn Backend>,
        job_id: Uuid,
        config: &ImportConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ImportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let interval = Duration::from_millis(config.poll_interval_ms);

        info!(job_id = %job_id, "watching import job");
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                match backend.import_progress(job_id).await {
                    Ok(job) => {
                        if job.status.is_terminal() {
                            info!(job_id = %job_id, status = %job.status, "import finished");
                            let _ = tx.send(ImportEvent::Finished(job));
                            return;
                        }
                        debug!(
                            job_id = %job_id,
                            processed = job.processed_records,
                            total = job.total_records,
                            "import progress"
                        );
                        if tx.send(ImportEvent::Progress(job)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, error = %e, "import progress poll failed");
                        if tx.send(ImportEvent::PollError(e.to_string())).is_err() {
                            return;
                        }
                    }
                }
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!(job_id = %job_id, "import watcher stopped");
                        return;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        (
            Self {
                job_id,
                cancel,
                handle,
            },
            rx,
        )
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn is_watching(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops polling. The job itself keeps running server-side.
    pub fn stop(self) {
        self.cancel.cancel();
    }
}

impl Drop for ImportWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balcao_core::types::ImportStatus;
    use balcao_core::BalcaoError;
    use balcao_test_utils::mock_backend::CallKind;
    use balcao_test_utils::{fixtures, MockBackend};

    fn fast_config() -> ImportConfig {
        ImportConfig {
            poll_interval_ms: 20,
        }
    }

    #[tokio::test]
    async fn polls_until_terminal_then_stops() {
        let mock = Arc::new(MockBackend::new());
        let job_id = Uuid::new_v4();
        mock.push_job(fixtures::import_job(job_id, ImportStatus::Pending, 0, 10))
            .await;
        mock.push_job(fixtures::import_job(job_id, ImportStatus::Processing, 4, 10))
            .await;
        mock.push_job(fixtures::import_job(job_id, ImportStatus::Completed, 10, 10))
            .await;

        let backend: Arc<dyn Backend> = mock.clone();
        let (watcher, mut rx) = ImportWatcher::watch(backend, job_id, &fast_config());

        let mut snapshots = Vec::new();
        while let Some(event) = rx.recv().await {
            snapshots.push(event);
        }
        assert_eq!(snapshots.len(), 3);
        assert!(matches!(&snapshots[0], ImportEvent::Progress(job) if job.processed_records == 0));
        assert!(matches!(&snapshots[1], ImportEvent::Progress(job) if job.processed_records == 4));
        match &snapshots[2] {
            ImportEvent::Finished(job) => {
                assert_eq!(job.status, ImportStatus::Completed);
                assert!((job.progress_percent() - 100.0).abs() < f64::EPSILON);
            }
            other => panic!("expected finished, got {other:?}"),
        }

        // Terminal status ended the task; no further polls.
        let polls = mock.call_count(CallKind::ImportProgress).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(mock.call_count(CallKind::ImportProgress).await, polls);
        assert!(!watcher.is_watching());
    }

    #[tokio::test]
    async fn failed_job_is_terminal_too() {
        let mock = Arc::new(MockBackend::new());
        let job_id = Uuid::new_v4();
        let mut job = fixtures::import_job(job_id, ImportStatus::Failed, 3, 10);
        job.error_message = Some("malformed csv row 4".to_string());
        mock.push_job(job).await;

        let backend: Arc<dyn Backend> = mock.clone();
        let (_watcher, mut rx) = ImportWatcher::watch(backend, job_id, &fast_config());

        match rx.recv().await {
            Some(ImportEvent::Finished(job)) => {
                assert_eq!(job.status, ImportStatus::Failed);
                assert_eq!(job.error_message.as_deref(), Some("malformed csv row 4"));
            }
            other => panic!("expected finished, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_job_reports_zero_percent() {
        let mock = Arc::new(MockBackend::new());
        let job_id = Uuid::new_v4();
        // Defaults script a pending job with no declared totals.
        let backend: Arc<dyn Backend> = mock.clone();
        let (watcher, mut rx) = ImportWatcher::watch(backend, job_id, &fast_config());

        match rx.recv().await {
            Some(ImportEvent::Progress(job)) => {
                assert_eq!(job.total_records, 0);
                assert_eq!(job.progress_percent(), 0.0);
            }
            other => panic!("expected progress, got {other:?}"),
        }
        watcher.stop();
    }

    #[tokio::test]
    async fn poll_error_is_inline_and_polling_continues() {
        let mock = Arc::new(MockBackend::new());
        let job_id = Uuid::new_v4();
        mock.fail_next(
            CallKind::ImportProgress,
            BalcaoError::Api {
                status: 500,
                message: "progress store timeout".to_string(),
            },
        )
        .await;
        mock.push_job(fixtures::import_job(job_id, ImportStatus::Completed, 10, 10))
            .await;

        let backend: Arc<dyn Backend> = mock.clone();
        let (_watcher, mut rx) = ImportWatcher::watch(backend, job_id, &fast_config());

        match rx.recv().await {
            Some(ImportEvent::PollError(message)) => {
                assert!(message.contains("progress store timeout"));
            }
            other => panic!("expected poll error, got {other:?}"),
        }
        match rx.recv().await {
            Some(ImportEvent::Finished(job)) => assert_eq!(job.status, ImportStatus::Completed),
            other => panic!("expected finished, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stop_cancels_the_poll_loop() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let (watcher, mut rx) = ImportWatcher::watch(backend, Uuid::new_v4(), &fast_config());

        rx.recv().await;
        watcher.stop();

        while rx.recv().await.is_some() {}
        let polls = mock.call_count(CallKind::ImportProgress).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(mock.call_count(CallKind::ImportProgress).await, polls);
    }
}
