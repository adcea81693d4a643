/// Object upload and removal against the media bucket
use crate::{config::S3Config, S3Error};
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use std::sync::Arc;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload an object and return its public URL
    pub async fn upload_file(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(e).to_string()))?;

        tracing::debug!(bucket = %self.config.bucket, key, "object uploaded");
        Ok(self.config.public_url(key))
    }

    pub async fn delete_file(&self, key: &str) -> Result<(), S3Error> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(e).to_string()))?;

        tracing::debug!(bucket = %self.config.bucket, key, "object deleted");
        Ok(())
    }
}
