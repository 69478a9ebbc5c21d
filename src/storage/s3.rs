//! AWS S3 key-value backend.
//!
//! Each key is one object at `s3://{bucket}/{prefix}/{key}`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::storage::KvStore;

/// S3-based key-value storage.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create S3 storage using credentials from the environment.
    pub async fn from_env(bucket: &str, prefix: &str) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        Ok(Self::new(client, bucket, prefix))
    }

    /// Object key for a store key.
    fn object_key(&self, key: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", prefix, key)
        }
    }
}

#[async_trait]
impl KvStore for S3Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let object_key = self.object_key(key);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(AppError::storage)?
                    .into_bytes();
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    AppError::storage(format!("s3://{}/{} is not UTF-8: {e}", self.bucket, object_key))
                })?;
                Ok(Some(value))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing data at s3://{}/{}", self.bucket, object_key);
                    Ok(None)
                } else {
                    Err(AppError::storage(service_err))
                }
            }
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let object_key = self.object_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(value.as_bytes().to_vec()))
            .content_type("text/plain; charset=utf-8")
            .send()
            .await
            .map_err(AppError::storage)?;

        log::info!("Wrote {} bytes to s3://{}/{}", value.len(), self.bucket, object_key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = self.object_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(AppError::storage)?;

        log::info!("Deleted s3://{}/{}", self.bucket, object_key);
        Ok(())
    }
}
