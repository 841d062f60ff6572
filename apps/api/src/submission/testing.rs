//! In-memory collaborators for pipeline and handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::conversion::{ConversionError, DocumentConverter};
use crate::llm_client::LlmError;
use crate::storage::{FilePayload, FileStorage, KvStore, StorageError, StoredFile};
use crate::submission::feedback::{FeedbackError, FeedbackResponse, FeedbackService};
use crate::submission::pipeline::Collaborators;

pub fn resume_payload() -> FilePayload {
    FilePayload::new(
        "resume.pdf",
        "application/pdf",
        Bytes::from_static(b"%PDF-1.4 fake resume"),
    )
}

/// Stores uploads under `mock/{call index}/{name}`. Can fail on one call index.
#[derive(Default)]
pub struct MockStorage {
    fail_on: Option<usize>,
    calls: AtomicUsize,
    files: Mutex<Vec<(String, FilePayload)>>,
}

impl MockStorage {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(_, file)| file.name.clone())
            .collect()
    }
}

#[async_trait]
impl FileStorage for MockStorage {
    async fn upload(&self, file: &FilePayload) -> Result<StoredFile, StorageError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(index) {
            return Err(StorageError::S3("bucket unavailable".to_string()));
        }
        let path = format!("mock/{index}/{}", file.name);
        self.files
            .lock()
            .unwrap()
            .push((path.clone(), file.clone()));
        Ok(StoredFile {
            path,
            size: file.size(),
        })
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(stored, _)| stored == path)
            .map(|(_, file)| file.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[derive(Default)]
pub struct MockConverter {
    fail: bool,
    calls: AtomicUsize,
}

impl MockConverter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentConverter for MockConverter {
    async fn convert_pdf_to_image(&self, pdf: &FilePayload) -> Result<FilePayload, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ConversionError::Rendering("corrupt PDF".to_string()));
        }
        Ok(FilePayload::new(
            format!("{}.png", pdf.stem()),
            "image/png",
            Bytes::from_static(b"\x89PNG fake"),
        ))
    }
}

/// Key-value store backed by a map, with an ordered log of every write.
#[derive(Default)]
pub struct MemoryKv {
    unavailable: bool,
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryKv {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::S3("kv store unavailable".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }
}

/// Returns a fixed response, or fails when none is configured.
#[derive(Default)]
pub struct MockAnalyzer {
    response: Option<FeedbackResponse>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockAnalyzer {
    pub fn returning(response: FeedbackResponse) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackService for MockAnalyzer {
    async fn feedback(
        &self,
        resume_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, FeedbackError> {
        self.calls
            .lock()
            .unwrap()
            .push((resume_path.to_string(), instructions.to_string()));
        self.response
            .clone()
            .ok_or(FeedbackError::Llm(LlmError::RateLimited { retries: 3 }))
    }
}

/// Collaborators that complete every step with the given feedback text.
pub fn happy_collaborators(feedback: &str) -> (Collaborators, Arc<MemoryKv>) {
    let kv = Arc::new(MemoryKv::default());
    let collaborators = Collaborators {
        storage: Arc::new(MockStorage::default()),
        converter: Arc::new(MockConverter::default()),
        kv: kv.clone(),
        analyzer: Arc::new(MockAnalyzer::returning(FeedbackResponse::text(feedback))),
    };
    (collaborators, kv)
}
