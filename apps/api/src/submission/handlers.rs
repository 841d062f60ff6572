use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{record_key, SubmissionRecord};
use crate::state::AppState;
use crate::storage::FilePayload;
use crate::submission::form::{FormField, SubmissionForm};
use crate::submission::pipeline::{PipelineOutcome, SubmissionPipeline};
use crate::submission::status::PipelineStatus;
use crate::utils::format_size;

const DEFAULT_RESUME_NAME: &str = "resume.pdf";
const DEFAULT_RESUME_TYPE: &str = "application/pdf";

#[derive(Debug, Serialize)]
pub struct SubmissionAccepted {
    pub submission_id: Uuid,
    pub status_url: String,
}

/// POST /api/v1/resumes/analyze
///
/// Multipart form with `company-name`, `job-title`, `job-description` and a
/// `resume` file. Responds 422 with per-field errors when anything is missing,
/// otherwise starts the pipeline in the background and responds 202.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionAccepted>), AppError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match FormField::from_form_name(&name) {
            Some(FormField::Resume) => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_RESUME_NAME)
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_RESUME_TYPE)
                    .to_string();
                let bytes: Bytes = field.bytes().await?;
                form.select_file(Some(FilePayload::new(file_name, content_type, bytes)));
            }
            Some(_) => {
                let value = field.text().await?;
                form.handle_change(&name, value);
            }
            None => debug!("Skipping unknown form field '{name}'"),
        }
    }

    let submission = form.submit().map_err(|errors| {
        let fields: Vec<&str> = errors.invalid_fields().into_iter().map(FormField::key).collect();
        warn!("Rejected submission, invalid fields: {}", fields.join(", "));
        AppError::InvalidForm(errors)
    })?;
    info!(
        "Accepted resume '{}' ({}) for {} at {}",
        submission.resume.name,
        format_size(submission.resume.size()),
        submission.job_title,
        submission.company_name
    );

    let reporter = state.status_board.register().await;
    let submission_id = reporter.submission_id();
    let pipeline = SubmissionPipeline::new(state.collaborators.clone(), reporter).start(submission);
    tokio::spawn(async move {
        match pipeline.run().await {
            PipelineOutcome::Completed(record) => {
                info!(%submission_id, record_id = %record.id(), "Submission analyzed");
            }
            PipelineOutcome::Failed { failure, pending } => {
                warn!(
                    %submission_id,
                    pending_record = ?pending.map(|r| r.id()),
                    "Submission failed: {failure}"
                );
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmissionAccepted {
            submission_id,
            status_url: format!("/api/v1/submissions/{submission_id}"),
        }),
    ))
}

/// GET /api/v1/submissions/:id
pub async fn handle_get_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PipelineStatus>, AppError> {
    let status = state.status_board.get(id).await?;
    Ok(Json(status))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionRecord>, AppError> {
    let raw = state
        .collaborators
        .kv
        .get(&record_key(&id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    let record: SubmissionRecord = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Stored record {id} is unreadable: {e}"))?;
    debug!(completed = record.is_completed(), "Serving resume {id}");
    Ok(Json(record))
}
