/// S3 configuration for the media bucket
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Public base URL objects are served from (CDN or bucket endpoint)
    pub base_url: String,
    /// Custom endpoint for S3-compatible stores such as MinIO
    pub endpoint: Option<String>,
    /// Whether to use path-style addressing against `endpoint`
    pub path_style: bool,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "microblog-media".to_string());
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let base_url = std::env::var("S3_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"));

        Self {
            bucket,
            region,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Public URL for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Recover the object key from a URL produced by [`public_url`].
    ///
    /// Returns `None` for URLs that point somewhere else.
    ///
    /// [`public_url`]: S3Config::public_url
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}
