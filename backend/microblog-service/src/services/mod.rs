//! Business logic on top of the repository traits
//!
//! Each service validates its input before the first write and maps
//! missing entities and permission failures onto `AppError`.

pub mod auth;
pub mod engagement;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod relationships;

pub use auth::AuthService;
pub use engagement::EngagementService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use profile::ProfileService;
pub use relationships::{FollowOutcome, RelationshipService};

use crate::media::MediaStore;

/// Delete an image, logging instead of failing
pub(crate) async fn delete_image_best_effort(media: &dyn MediaStore, url: &str) {
    if let Err(e) = media.delete(url).await {
        tracing::warn!(url, error = %e, "failed to delete stored image");
    }
}
