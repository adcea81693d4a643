/// HTTP handlers
///
/// Thin adapters: extract, call a service, shape the JSON response.
pub mod auth;
pub mod health;
pub mod notifications;
pub mod posts;
pub mod users;

use crate::error::AppError;
use uuid::Uuid;

/// Parse a path id. An id that is not a UUID cannot name an existing entity,
/// so it is reported the same way as a missing one.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(not_found))
}

pub(crate) fn message(text: &str) -> serde_json::Value {
    serde_json::json!({ "message": text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Post not found").unwrap(), id);

        let err = parse_id("123", "Post not found").unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Post not found"));
    }
}
