//! Image storage
//!
//! Clients send images inline as `data:<mime>;base64,<bytes>` URLs. They are
//! decoded here, uploaded to the media bucket and replaced by the public URL
//! the bucket serves them from.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use s3_utils::{S3Error, S3Operations};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Image is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("media storage failed: {0}")]
    Storage(String),
}

impl From<S3Error> for MediaError {
    fn from(err: S3Error) -> Self {
        MediaError::Storage(err.to_string())
    }
}

/// Where uploaded images go
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image given as a data URL and return its public URL
    async fn upload(&self, payload: &str) -> Result<String, MediaError>;

    /// Remove a previously uploaded image by its public URL
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

/// A decoded `data:` URL
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrlImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrlImage {
    /// File extension used for the stored object key
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "img",
        }
    }
}

pub fn parse_data_url(payload: &str, max_bytes: usize) -> Result<DataUrlImage, MediaError> {
    let invalid = || MediaError::InvalidPayload("Image must be a base64 data URL".to_string());

    let rest = payload.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, data) = rest.split_once(',').ok_or_else(invalid)?;
    let content_type = meta.strip_suffix(";base64").ok_or_else(invalid)?;

    if !content_type.starts_with("image/") {
        return Err(MediaError::InvalidPayload(
            "Only image uploads are supported".to_string(),
        ));
    }

    let bytes = STANDARD.decode(data).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }
    if bytes.len() > max_bytes {
        return Err(MediaError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    Ok(DataUrlImage {
        content_type: content_type.to_ascii_lowercase(),
        bytes,
    })
}

/// Media store backed by the S3 bucket
pub struct S3MediaStore {
    ops: S3Operations,
    max_bytes: usize,
}

impl S3MediaStore {
    pub fn new(ops: S3Operations, max_bytes: usize) -> Self {
        Self { ops, max_bytes }
    }
}

#[async_trait::async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, payload: &str) -> Result<String, MediaError> {
        let image = parse_data_url(payload, self.max_bytes)?;
        let key = format!("images/{}.{}", Uuid::new_v4(), image.extension());

        let url = self
            .ops
            .upload_file(&key, image.bytes, &image.content_type)
            .await?;

        tracing::info!(key = %key, "image uploaded");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let Some(key) = self.ops.config().key_from_url(url) else {
            tracing::warn!(url, "image is not stored in the media bucket, skipping delete");
            return Ok(());
        };

        self.ops.delete_file(key).await?;
        tracing::info!(key, "image deleted");
        Ok(())
    }
}
