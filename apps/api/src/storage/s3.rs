use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::storage::{FilePayload, FileStorage, StorageError, StoredFile};
use crate::utils::{format_size, generate_uuid};

/// Object storage on S3 (MinIO locally). Every upload gets its own
/// `uploads/{uuid}/` prefix so identical file names never collide.
#[derive(Clone)]
pub struct S3FileStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    async fn upload(&self, file: &FilePayload) -> Result<StoredFile, StorageError> {
        let key = object_key(&generate_uuid().to_string(), &file.name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.bytes.clone()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload of {key} failed: {e}")))?;

        info!(
            "Uploaded {} ({}) to s3://{}/{}",
            file.name,
            format_size(file.size()),
            self.bucket,
            key
        );

        Ok(StoredFile {
            path: key,
            size: file.size(),
        })
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::S3(format!("download of {path} failed: {service_error}"))
                }
            })?;

        let body = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading {path} failed: {e}")))?;

        Ok(body.into_bytes())
    }
}

fn object_key(prefix: &str, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe_name = if safe_name.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        safe_name
    };
    format!("uploads/{prefix}/{safe_name}")
}
