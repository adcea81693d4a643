//! S3 access for uploaded media
//!
//! Wraps the AWS SDK client with the bucket configuration and the two
//! operations the service needs: put an object, delete an object.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, error::DisplayErrorContext, Client};
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    #[error("S3 request failed: {0}")]
    Request(String),
}

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Build a client from the ambient AWS credentials and `config`
    pub async fn with_config(config: S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }

    /// Health check for bucket reachability
    pub async fn health_check(&self) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}
