use super::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: Option<String>,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post with author, likes and comments joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub user: UserSummary,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
}

/// Which posts a listing returns; every listing is newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    /// A single post by id
    Id(Uuid),
    /// Posts written by this user
    Author(Uuid),
    /// Posts this user has liked
    LikedBy(Uuid),
    /// Posts written by anyone this user follows
    FollowedBy(Uuid),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    pub img: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}
