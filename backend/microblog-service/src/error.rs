/// Error types for the microblog service
///
/// Client errors carry their message to the response body. Server-side
/// failures are logged with their detail and answered with a generic body.
use crate::media::MediaError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::{JwtError, PasswordError};
use validator::ValidationErrors;

/// Result type for microblog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or rejected input
    #[error("{0}")]
    Validation(String),

    /// Request is well-formed but not allowed in the current state
    #[error("{0}")]
    InvalidOperation(String),

    /// Session is valid but no longer names a usable identity
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("media error: {0}")]
    Media(MediaError),

    #[error("token error: {0}")]
    Token(#[from] JwtError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Media(_) | AppError::Token(_) | AppError::Internal(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Media(_)
            | AppError::Token(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = if self.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidPayload(msg) => AppError::Validation(msg),
            too_large @ MediaError::TooLarge { .. } => AppError::Validation(too_large.to_string()),
            other => AppError::Media(other),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Pick one message out of `errors`, checking fields in `order` first so the
/// reported problem does not depend on map iteration order.
pub fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let fields = errors.field_errors();

    let from_ordered = order
        .iter()
        .filter_map(|name| fields.get(*name))
        .flat_map(|errs| errs.iter());
    let from_rest = fields.values().flat_map(|errs| errs.iter());

    from_ordered
        .chain(from_rest)
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let err = AppError::validation("Invalid email format");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid email format");

        assert_eq!(
            AppError::InvalidOperation("nope".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::forbidden("no").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("gone").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthenticated("who".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_rt::test]
    async fn test_server_errors_hide_detail() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = err.error_response();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_bad_media_payload_is_validation() {
        let err: AppError = MediaError::InvalidPayload("Image must be a data URL".into()).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = MediaError::TooLarge { size: 10, limit: 5 }.into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = MediaError::Storage("bucket unreachable".into()).into();
        assert!(matches!(err, AppError::Media(_)));
    }
}
