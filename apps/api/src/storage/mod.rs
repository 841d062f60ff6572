//! Storage collaborators: object storage for uploaded files and a key-value
//! store for submission records.
//!
//! The pipeline only sees the traits. `AppState` carries `Arc<dyn FileStorage>`
//! and `Arc<dyn KvStore>`, wired to S3 / Redis at startup.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod kv;
pub mod s3;

pub use kv::RedisKvStore;
pub use s3::S3FileStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Object not found: {0}")]
    NotFound(String),
}

/// An in-memory file on its way into storage: the resume PDF or its preview image.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File name without its final extension: `jane_doe.pdf` → `jane_doe`.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// Handle returned by a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Storage location, later handed to the feedback service.
    pub path: String,
    pub size: u64,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, file: &FilePayload) -> Result<StoredFile, StorageError>;

    async fn download(&self, path: &str) -> Result<Bytes, StorageError>;
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
}
