//! The AI feedback collaborator and its response shape.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::storage::{FileStorage, StorageError};
use crate::submission::instructions::ANALYSIS_SYSTEM;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("could not read resume: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// What the feedback service returns: `{"message": {"content": ...}}` where
/// content is either plain text or a list of text parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: FeedbackMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub text: String,
}

impl FeedbackResponse {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: FeedbackMessage {
                content: MessageContent::Text(text.into()),
            },
        }
    }

    /// The feedback text: the plain content, or the first part of a multi-part message.
    pub fn feedback_text(&self) -> Option<&str> {
        match &self.message.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(parts) => parts.first().map(|p| p.text.as_str()),
        }
    }

    /// Parses the feedback text as JSON, tolerating markdown code fences.
    pub fn parse_json(&self) -> Option<serde_json::Result<serde_json::Value>> {
        self.feedback_text()
            .map(|text| serde_json::from_str(strip_json_fences(text)))
    }
}

/// Scores a stored resume against analysis instructions.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn feedback(
        &self,
        resume_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, FeedbackError>;
}

/// Feedback through Claude: the stored PDF is fetched and attached as a document.
pub struct LlmFeedbackService {
    llm: LlmClient,
    storage: Arc<dyn FileStorage>,
}

impl LlmFeedbackService {
    pub fn new(llm: LlmClient, storage: Arc<dyn FileStorage>) -> Self {
        Self { llm, storage }
    }
}

#[async_trait]
impl FeedbackService for LlmFeedbackService {
    async fn feedback(
        &self,
        resume_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, FeedbackError> {
        let pdf = self.storage.download(resume_path).await?;
        debug!("Requesting feedback for {resume_path} ({} bytes)", pdf.len());

        let response = self
            .llm
            .call_with_pdf(&pdf, instructions, ANALYSIS_SYSTEM)
            .await?;

        let parts: Vec<ContentPart> = response
            .texts()
            .map(|text| ContentPart {
                text: text.to_string(),
            })
            .collect();
        if parts.is_empty() {
            return Err(LlmError::EmptyContent.into());
        }

        Ok(FeedbackResponse {
            message: FeedbackMessage {
                content: MessageContent::Parts(parts),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_content() {
        let response: FeedbackResponse =
            serde_json::from_value(json!({"message": {"content": "{\"overallScore\": 61}"}}))
                .unwrap();
        assert_eq!(response.feedback_text(), Some("{\"overallScore\": 61}"));
    }

    #[test]
    fn test_multi_part_content_uses_first_part() {
        let response: FeedbackResponse = serde_json::from_value(json!({
            "message": {"content": [{"text": "{\"overallScore\": 75}"}, {"text": "ignored"}]}
        }))
        .unwrap();
        assert_eq!(response.feedback_text(), Some("{\"overallScore\": 75}"));
    }

    #[test]
    fn test_empty_parts_have_no_text() {
        let response = FeedbackResponse {
            message: FeedbackMessage {
                content: MessageContent::Parts(vec![]),
            },
        };
        assert_eq!(response.feedback_text(), None);
        assert!(response.parse_json().is_none());
    }

    #[test]
    fn test_parse_json_strips_fences() {
        let response = FeedbackResponse::text("```json\n{\"overallScore\": 88}\n```");
        let parsed = response.parse_json().unwrap().unwrap();
        assert_eq!(parsed, json!({"overallScore": 88}));
    }

    #[test]
    fn test_parse_json_reports_malformed_text() {
        let response = FeedbackResponse::text("Sure! Here is my review of the resume.");
        assert!(response.parse_json().unwrap().is_err());
    }
}
