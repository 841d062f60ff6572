//! Observable pipeline progress.
//!
//! Each run owns a `StatusReporter` (the sending half of a `watch` channel).
//! The `StatusBoard` keeps the receiving halves so HTTP clients can poll the
//! latest snapshot by submission id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::generate_uuid;

/// Terminal failures. The Display text is what users see after `Error: `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineFailure {
    #[error("Failed to upload file")]
    UploadResume,

    #[error("Failed to convert PDF to image")]
    ConvertToImage,

    #[error("Failed to upload image")]
    UploadImage,

    #[error("Failed to save analysis record")]
    PersistRecord,

    #[error("Failed to analyze resume")]
    Analyze,

    #[error("Failed to read analysis result")]
    MalformedFeedback,
}

/// Pipeline stages in execution order. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "failure", rename_all = "snake_case")]
pub enum Stage {
    Idle,
    UploadingResume,
    ConvertingToImage,
    UploadingImage,
    PreparingRecord,
    Analyzing,
    Completed,
    Failed(PipelineFailure),
}

impl Stage {
    pub fn status_text(&self) -> String {
        match self {
            Stage::Idle => String::new(),
            Stage::UploadingResume => "Uploading the file...".to_string(),
            Stage::ConvertingToImage => "Converting to image...".to_string(),
            Stage::UploadingImage => "Uploading the image...".to_string(),
            Stage::PreparingRecord => "Preparing data...".to_string(),
            Stage::Analyzing => "Analyzing...".to_string(),
            Stage::Completed => "Analysis complete".to_string(),
            Stage::Failed(failure) => format!("Error: {failure}"),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed(_))
    }
}

/// Snapshot served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub stage: Stage,
    pub status_text: String,
    pub processing: bool,
    /// Set once the pending record has been written.
    pub record_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineStatus {
    fn idle() -> Self {
        Self {
            stage: Stage::Idle,
            status_text: Stage::Idle.status_text(),
            processing: false,
            record_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// Write side of one run's status.
#[derive(Debug)]
pub struct StatusReporter {
    submission_id: Uuid,
    tx: watch::Sender<PipelineStatus>,
}

impl StatusReporter {
    /// A reporter not registered on any board, with its receiver.
    pub fn detached() -> (Self, watch::Receiver<PipelineStatus>) {
        let (tx, rx) = watch::channel(PipelineStatus::idle());
        (
            Self {
                submission_id: generate_uuid(),
                tx,
            },
            rx,
        )
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub(crate) fn begin(&self) {
        self.tx.send_modify(|status| {
            status.processing = true;
            status.updated_at = Utc::now();
        });
    }

    pub(crate) fn advance(&self, stage: Stage) {
        let status_text = stage.status_text();
        match stage {
            Stage::Failed(_) => warn!(submission_id = %self.submission_id, "{status_text}"),
            _ => info!(submission_id = %self.submission_id, "{status_text}"),
        }
        self.tx.send_modify(|status| {
            status.stage = stage;
            status.status_text = status_text;
            if stage.is_terminal() {
                status.processing = false;
            }
            status.updated_at = Utc::now();
        });
    }

    pub(crate) fn attach_record(&self, record_id: Uuid) {
        self.tx.send_modify(|status| {
            status.record_id = Some(record_id);
            status.updated_at = Utc::now();
        });
    }
}

#[derive(Debug, Error)]
#[error("Submission {0} not found")]
pub struct UnknownSubmission(pub Uuid);

/// How long a finished run stays readable when no retention is configured.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Latest status of every submission started by this process. Finished runs
/// are dropped once their last update is older than the retention window.
#[derive(Clone)]
pub struct StatusBoard {
    runs: Arc<RwLock<HashMap<Uuid, watch::Receiver<PipelineStatus>>>>,
    retention: Duration,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl StatusBoard {
    pub fn new(retention: Duration) -> Self {
        Self {
            runs: Arc::default(),
            retention,
        }
    }

    /// Opens a status slot for a new submission, evicting expired runs first.
    pub async fn register(&self) -> StatusReporter {
        let (reporter, rx) = StatusReporter::detached();
        let mut runs = self.runs.write().await;

        let now = Utc::now();
        let before = runs.len();
        runs.retain(|_, rx| !self.is_expired(&rx.borrow(), now));
        if runs.len() < before {
            debug!("Evicted {} finished submissions", before - runs.len());
        }

        runs.insert(reporter.submission_id, rx);
        reporter
    }

    fn is_expired(&self, status: &PipelineStatus, now: DateTime<Utc>) -> bool {
        status.stage.is_terminal()
            && (now - status.updated_at)
                .to_std()
                .is_ok_and(|age| age >= self.retention)
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn get(&self, submission_id: Uuid) -> Result<PipelineStatus, UnknownSubmission> {
        self.runs
            .read()
            .await
            .get(&submission_id)
            .map(|rx| rx.borrow().clone())
            .ok_or(UnknownSubmission(submission_id))
    }
}
