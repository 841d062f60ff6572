use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Key-value store key for a submission record.
pub fn record_key(id: &Uuid) -> String {
    format!("resume:{id}")
}

/// Everything known about a submission once both files are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

/// A persisted submission. Stored as one JSON document whose `feedback` is
/// `""` while analysis is pending and the parsed feedback object afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordDocument", into = "RecordDocument")]
pub enum SubmissionRecord {
    Pending(RecordFields),
    Completed { fields: RecordFields, feedback: Value },
}

impl SubmissionRecord {
    pub fn fields(&self) -> &RecordFields {
        match self {
            SubmissionRecord::Pending(fields) => fields,
            SubmissionRecord::Completed { fields, .. } => fields,
        }
    }

    pub fn id(&self) -> Uuid {
        self.fields().id
    }

    pub fn key(&self) -> String {
        record_key(&self.id())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SubmissionRecord::Completed { .. })
    }

    /// Attaches analysis feedback. Feedback on an already completed record is replaced.
    pub fn complete(self, feedback: Value) -> Self {
        let fields = match self {
            SubmissionRecord::Pending(fields) => fields,
            SubmissionRecord::Completed { fields, .. } => fields,
        };
        SubmissionRecord::Completed { fields, feedback }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// On-the-wire shape shared by both record variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(flatten)]
    fields: RecordFields,
    #[serde(default = "pending_feedback")]
    feedback: Value,
}

fn pending_feedback() -> Value {
    Value::String(String::new())
}

impl From<SubmissionRecord> for RecordDocument {
    fn from(record: SubmissionRecord) -> Self {
        match record {
            SubmissionRecord::Pending(fields) => RecordDocument {
                fields,
                feedback: pending_feedback(),
            },
            SubmissionRecord::Completed { fields, feedback } => RecordDocument { fields, feedback },
        }
    }
}

impl From<RecordDocument> for SubmissionRecord {
    fn from(doc: RecordDocument) -> Self {
        match doc.feedback {
            Value::String(ref s) if s.is_empty() => SubmissionRecord::Pending(doc.fields),
            Value::Null => SubmissionRecord::Pending(doc.fields),
            feedback => SubmissionRecord::Completed {
                fields: doc.fields,
                feedback,
            },
        }
    }
}
