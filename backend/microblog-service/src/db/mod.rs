//! Repository traits
//!
//! Handlers and services only see these traits. `postgres::PgStore`
//! implements all of them; tests provide an in-memory implementation.
//!
//! Edge mutations that also emit a notification (`follow`, `like`) are one
//! call so that the implementation can make the pair atomic.

pub mod postgres;

pub use postgres::PgStore;

use crate::models::{
    Comment, NewUser, Notification, NotificationView, Post, PostFilter, PostView, ProfileChanges,
    User,
};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, sqlx::Error>;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn exists(&self, id: Uuid) -> RepoResult<bool>;

    async fn create(&self, user: NewUser) -> RepoResult<User>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<User>;

    /// Random users other than `user_id` that `user_id` does not follow
    async fn suggested(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<User>>;
}

#[async_trait::async_trait]
pub trait RelationshipRepository: Send + Sync {
    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool>;

    /// Add the edge and a follow notification for `following_id`.
    ///
    /// Returns `false` without notifying when the edge already existed.
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool>;

    /// Remove the edge; returns whether it existed
    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        text: Option<String>,
        img: Option<String>,
    ) -> RepoResult<Post>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Post>>;

    /// Delete the post with its likes and comments
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    async fn has_liked(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    /// Add the like and a like notification for `owner_id`.
    ///
    /// Returns `false` without notifying when the like already existed.
    async fn like(&self, post_id: Uuid, user_id: Uuid, owner_id: Uuid) -> RepoResult<bool>;

    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    /// Users who like the post, in the order they liked it
    async fn likes(&self, post_id: Uuid) -> RepoResult<Vec<Uuid>>;

    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, text: &str) -> RepoResult<Comment>;

    /// Posts matching `filter`, newest first, with author, likes and comments
    async fn list(&self, filter: PostFilter) -> RepoResult<Vec<PostView>>;
}

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Notifications addressed to `user_id`, newest first
    async fn list_for_recipient(&self, user_id: Uuid) -> RepoResult<Vec<NotificationView>>;

    /// Flag exactly these notifications as read
    async fn mark_read(&self, ids: &[Uuid]) -> RepoResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Notification>>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    async fn delete_for_recipient(&self, user_id: Uuid) -> RepoResult<u64>;
}

/// Liveness probe for the backing store
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> RepoResult<()>;
}
