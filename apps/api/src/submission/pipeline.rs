//! The submission pipeline: upload → convert → upload → persist → analyze → persist.
//!
//! Steps run strictly in sequence and the first failure ends the run. Nothing
//! is retried or rolled back. The pending record is written before analysis
//! so the key-value store shows "submitted, not yet analyzed" while the AI
//! call is in flight.
//!
//! The pipeline is a typestate: `SubmissionPipeline<Idle>::start` consumes the
//! idle pipeline and a `ValidatedSubmission`, and `run` consumes the
//! processing one. A run can therefore neither start twice nor start from an
//! unvalidated form.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::conversion::DocumentConverter;
use crate::models::{RecordFields, SubmissionRecord};
use crate::storage::{FileStorage, KvStore};
use crate::submission::feedback::FeedbackService;
use crate::submission::form::ValidatedSubmission;
use crate::submission::instructions::prepare_instructions;
use crate::submission::status::{PipelineFailure, Stage, StatusReporter};
use crate::utils::{format_size, generate_uuid};

/// The external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn FileStorage>,
    pub converter: Arc<dyn DocumentConverter>,
    pub kv: Arc<dyn KvStore>,
    pub analyzer: Arc<dyn FeedbackService>,
}

/// Waiting for a validated submission.
pub struct Idle;

/// Running with this submission.
pub struct Processing {
    submission: ValidatedSubmission,
}

pub struct SubmissionPipeline<S> {
    collaborators: Collaborators,
    status: StatusReporter,
    state: S,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(SubmissionRecord),
    Failed {
        failure: PipelineFailure,
        /// The last record written before the failure, if any.
        pending: Option<SubmissionRecord>,
    },
}

/// Internal early-exit carrying what was persisted so far.
struct StepFailure {
    failure: PipelineFailure,
    pending: Option<SubmissionRecord>,
}

impl From<PipelineFailure> for StepFailure {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            failure,
            pending: None,
        }
    }
}

impl SubmissionPipeline<Idle> {
    pub fn new(collaborators: Collaborators, status: StatusReporter) -> Self {
        Self {
            collaborators,
            status,
            state: Idle,
        }
    }

    pub fn start(self, submission: ValidatedSubmission) -> SubmissionPipeline<Processing> {
        self.status.begin();
        info!(
            submission_id = %self.status.submission_id(),
            company = %submission.company_name,
            job_title = %submission.job_title,
            resume = %submission.resume.name,
            size = %format_size(submission.resume.size()),
            "Starting resume analysis"
        );
        SubmissionPipeline {
            collaborators: self.collaborators,
            status: self.status,
            state: Processing { submission },
        }
    }
}

impl SubmissionPipeline<Processing> {
    /// Runs every step to completion or to the first failure. The final stage
    /// is published before returning.
    pub async fn run(self) -> PipelineOutcome {
        match self.execute().await {
            Ok(record) => {
                self.status.advance(Stage::Completed);
                PipelineOutcome::Completed(record)
            }
            Err(StepFailure { failure, pending }) => {
                self.status.advance(Stage::Failed(failure));
                PipelineOutcome::Failed { failure, pending }
            }
        }
    }

    async fn execute(&self) -> Result<SubmissionRecord, StepFailure> {
        let submission = &self.state.submission;
        let Collaborators {
            storage,
            converter,
            kv,
            analyzer,
        } = &self.collaborators;

        self.status.advance(Stage::UploadingResume);
        let uploaded_resume = storage.upload(&submission.resume).await.map_err(|e| {
            warn!("Resume upload failed: {e}");
            PipelineFailure::UploadResume
        })?;
        debug!(
            "Resume stored at {} ({})",
            uploaded_resume.path,
            format_size(uploaded_resume.size)
        );

        self.status.advance(Stage::ConvertingToImage);
        let image = converter
            .convert_pdf_to_image(&submission.resume)
            .await
            .map_err(|e| {
                warn!("PDF conversion failed: {e}");
                PipelineFailure::ConvertToImage
            })?;

        self.status.advance(Stage::UploadingImage);
        let uploaded_image = storage.upload(&image).await.map_err(|e| {
            warn!("Preview image upload failed: {e}");
            PipelineFailure::UploadImage
        })?;

        self.status.advance(Stage::PreparingRecord);
        let pending = SubmissionRecord::Pending(RecordFields {
            id: generate_uuid(),
            resume_path: uploaded_resume.path.clone(),
            image_path: uploaded_image.path,
            company_name: submission.company_name.clone(),
            job_title: submission.job_title.clone(),
            job_description: submission.job_description.clone(),
        });
        persist(kv.as_ref(), &pending).await?;
        self.status.attach_record(pending.id());

        self.status.advance(Stage::Analyzing);
        let instructions = prepare_instructions(&submission.job_title, &submission.job_description);
        let response = match analyzer.feedback(&uploaded_resume.path, &instructions).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Feedback request failed: {e}");
                return Err(StepFailure {
                    failure: PipelineFailure::Analyze,
                    pending: Some(pending),
                });
            }
        };

        let feedback = match response.parse_json() {
            Some(Ok(feedback)) => feedback,
            Some(Err(e)) => {
                error!("Feedback is not valid JSON: {e}");
                return Err(StepFailure {
                    failure: PipelineFailure::MalformedFeedback,
                    pending: Some(pending),
                });
            }
            None => {
                error!("Feedback response carried no text");
                return Err(StepFailure {
                    failure: PipelineFailure::MalformedFeedback,
                    pending: Some(pending),
                });
            }
        };

        let completed = pending.clone().complete(feedback);
        if let Err(failure) = persist(kv.as_ref(), &completed).await {
            return Err(StepFailure {
                failure: failure.failure,
                pending: Some(pending),
            });
        }

        Ok(completed)
    }
}

async fn persist(kv: &dyn KvStore, record: &SubmissionRecord) -> Result<(), StepFailure> {
    let json = record.to_json().map_err(|e| {
        error!("Could not serialize record {}: {e}", record.id());
        PipelineFailure::PersistRecord
    })?;
    kv.set(&record.key(), &json).await.map_err(|e| {
        error!("Could not persist record {}: {e}", record.id());
        PipelineFailure::PersistRecord
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::feedback::{ContentPart, FeedbackMessage, FeedbackResponse, MessageContent};
    use crate::submission::form::SubmissionForm;
    use crate::submission::testing::{
        resume_payload, MemoryKv, MockAnalyzer, MockConverter, MockStorage,
    };
    use crate::submission::status::PipelineStatus;
    use serde_json::{json, Value};
    use tokio::sync::watch;

    struct Harness {
        storage: Arc<MockStorage>,
        converter: Arc<MockConverter>,
        kv: Arc<MemoryKv>,
        analyzer: Arc<MockAnalyzer>,
    }

    impl Harness {
        fn new(storage: MockStorage, converter: MockConverter, analyzer: MockAnalyzer) -> Self {
            Self {
                storage: Arc::new(storage),
                converter: Arc::new(converter),
                kv: Arc::new(MemoryKv::default()),
                analyzer: Arc::new(analyzer),
            }
        }

        fn happy() -> Self {
            Self::new(
                MockStorage::default(),
                MockConverter::default(),
                MockAnalyzer::returning(FeedbackResponse::text(r#"{"overallScore": 82}"#)),
            )
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                storage: self.storage.clone(),
                converter: self.converter.clone(),
                kv: self.kv.clone(),
                analyzer: self.analyzer.clone(),
            }
        }

        async fn run(&self) -> (PipelineOutcome, watch::Receiver<PipelineStatus>) {
            let (reporter, rx) = StatusReporter::detached();
            let outcome = SubmissionPipeline::new(self.collaborators(), reporter)
                .start(submission())
                .run()
                .await;
            (outcome, rx)
        }
    }

    fn submission() -> ValidatedSubmission {
        let mut form = SubmissionForm::default();
        form.handle_change("company-name", "Acme");
        form.handle_change("job-title", "Backend Engineer");
        form.handle_change("job-description", "Build payment APIs in Rust.");
        form.select_file(Some(resume_payload()));
        form.submit().unwrap()
    }

    fn parsed(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_persists_pending_then_completed() {
        let harness = Harness::happy();
        let (outcome, rx) = harness.run().await;

        let record = match outcome {
            PipelineOutcome::Completed(record) => record,
            other => panic!("expected completion, got {other:?}"),
        };

        let writes = harness.kv.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, writes[1].0);
        assert_eq!(writes[0].0, format!("resume:{}", record.id()));

        let first = parsed(&writes[0].1);
        let second = parsed(&writes[1].1);
        assert_eq!(first["feedback"], "");
        assert_eq!(second["feedback"], json!({"overallScore": 82}));
        assert_eq!(first["id"], second["id"]);

        let status = rx.borrow().clone();
        assert_eq!(status.stage, Stage::Completed);
        assert_eq!(status.status_text, "Analysis complete");
        assert!(!status.processing);
        assert_eq!(status.record_id, Some(record.id()));
    }

    #[tokio::test]
    async fn test_record_carries_paths_and_job_details() {
        let harness = Harness::happy();
        let (outcome, _) = harness.run().await;
        let PipelineOutcome::Completed(record) = outcome else {
            panic!("expected completion");
        };

        let uploads = harness.storage.uploaded_names();
        assert_eq!(uploads, vec!["resume.pdf", "resume.png"]);

        let fields = record.fields();
        assert_eq!(fields.resume_path, "mock/0/resume.pdf");
        assert_eq!(fields.image_path, "mock/1/resume.png");
        assert_eq!(fields.company_name, "Acme");
        assert_eq!(fields.job_title, "Backend Engineer");
        assert_eq!(fields.job_description, "Build payment APIs in Rust.");
    }

    #[tokio::test]
    async fn test_analyzer_receives_resume_path_and_job_instructions() {
        let harness = Harness::happy();
        harness.run().await;

        let calls = harness.analyzer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "mock/0/resume.pdf");
        assert!(calls[0].1.contains("Backend Engineer"));
        assert!(calls[0].1.contains("Build payment APIs in Rust."));
    }

    #[tokio::test]
    async fn test_resume_upload_failure_stops_everything() {
        let harness = Harness::new(
            MockStorage::failing_on(0),
            MockConverter::default(),
            MockAnalyzer::returning(FeedbackResponse::text("{}")),
        );
        let (outcome, rx) = harness.run().await;

        assert_eq!(
            outcome,
            PipelineOutcome::Failed {
                failure: PipelineFailure::UploadResume,
                pending: None
            }
        );
        assert_eq!(rx.borrow().status_text, "Error: Failed to upload file");
        assert!(!rx.borrow().processing);
        assert_eq!(harness.converter.call_count(), 0);
        assert_eq!(harness.storage.call_count(), 1);
        assert!(harness.kv.writes().is_empty());
        assert!(harness.analyzer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_conversion_failure_skips_image_upload() {
        let harness = Harness::new(
            MockStorage::default(),
            MockConverter::failing(),
            MockAnalyzer::returning(FeedbackResponse::text("{}")),
        );
        let (outcome, rx) = harness.run().await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Failed {
                failure: PipelineFailure::ConvertToImage,
                ..
            }
        ));
        assert_eq!(rx.borrow().status_text, "Error: Failed to convert PDF to image");
        assert_eq!(harness.storage.call_count(), 1);
        assert!(harness.kv.writes().is_empty());
    }

    #[tokio::test]
    async fn test_image_upload_failure_writes_nothing() {
        let harness = Harness::new(
            MockStorage::failing_on(1),
            MockConverter::default(),
            MockAnalyzer::returning(FeedbackResponse::text("{}")),
        );
        let (outcome, rx) = harness.run().await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Failed {
                failure: PipelineFailure::UploadImage,
                pending: None
            }
        ));
        assert_eq!(rx.borrow().status_text, "Error: Failed to upload image");
        assert!(harness.kv.writes().is_empty());
        assert!(harness.analyzer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure_leaves_pending_record() {
        let harness = Harness::new(
            MockStorage::default(),
            MockConverter::default(),
            MockAnalyzer::failing(),
        );
        let (outcome, rx) = harness.run().await;

        let writes = harness.kv.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(parsed(&writes[0].1)["feedback"], "");

        match outcome {
            PipelineOutcome::Failed {
                failure: PipelineFailure::Analyze,
                pending: Some(record),
            } => {
                assert!(!record.is_completed());
                assert_eq!(writes[0].0, record.key());
            }
            other => panic!("expected analysis failure, got {other:?}"),
        }
        assert_eq!(rx.borrow().status_text, "Error: Failed to analyze resume");
        assert!(rx.borrow().record_id.is_some());
    }

    #[tokio::test]
    async fn test_multi_part_feedback_uses_first_part() {
        let response = FeedbackResponse {
            message: FeedbackMessage {
                content: MessageContent::Parts(vec![
                    ContentPart {
                        text: r#"{"overallScore": 64}"#.to_string(),
                    },
                    ContentPart {
                        text: "trailing commentary".to_string(),
                    },
                ]),
            },
        };
        let harness = Harness::new(
            MockStorage::default(),
            MockConverter::default(),
            MockAnalyzer::returning(response),
        );
        let (outcome, _) = harness.run().await;

        let PipelineOutcome::Completed(SubmissionRecord::Completed { feedback, .. }) = outcome
        else {
            panic!("expected a completed record");
        };
        assert_eq!(feedback, json!({"overallScore": 64}));
    }

    #[tokio::test]
    async fn test_malformed_feedback_keeps_pending_record() {
        let harness = Harness::new(
            MockStorage::default(),
            MockConverter::default(),
            MockAnalyzer::returning(FeedbackResponse::text("I could not read this resume.")),
        );
        let (outcome, rx) = harness.run().await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Failed {
                failure: PipelineFailure::MalformedFeedback,
                pending: Some(_)
            }
        ));
        assert_eq!(harness.kv.writes().len(), 1);
        assert_eq!(rx.borrow().status_text, "Error: Failed to read analysis result");
    }

    #[tokio::test]
    async fn test_kv_failure_before_analysis_skips_ai_call() {
        let harness = Harness {
            kv: Arc::new(MemoryKv::unavailable()),
            ..Harness::happy()
        };
        let (outcome, rx) = harness.run().await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Failed {
                failure: PipelineFailure::PersistRecord,
                pending: None
            }
        ));
        assert!(harness.analyzer.calls().is_empty());
        assert_eq!(rx.borrow().status_text, "Error: Failed to save analysis record");
    }

    #[tokio::test]
    async fn test_each_run_gets_a_fresh_record_id() {
        let harness = Harness::happy();
        let (first, _) = harness.run().await;
        let (second, _) = harness.run().await;

        let (PipelineOutcome::Completed(a), PipelineOutcome::Completed(b)) = (first, second) else {
            panic!("expected two completions");
        };
        assert_ne!(a.id(), b.id());
        assert_eq!(harness.kv.writes().len(), 4);
    }
}
