//! S3 implementation of `ObjectStore`, using the AWS SDK. Any
//! S3-compatible endpoint works; kotori only ever puts, removes and
//! head-checks, never lists.

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use domains::{ObjectStore, PipelineError, PipelineResult};

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a store from the ambient AWS environment (credentials chain,
    /// region, endpoint override).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

fn storage_err(action: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Storage(format!("s3 {action}: {err}"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> PipelineResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| storage_err("put", e))?;
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> PipelineResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_err("delete", e))?;
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> PipelineResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err)) if service_err.err().is_not_found() => {
                Ok(false)
            }
            Err(e) => Err(storage_err("head", e)),
        }
    }

    async fn make_bucket(&self, bucket: &str) -> PipelineResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| storage_err("create bucket", e))?;
        Ok(())
    }
}
