/// Likes and comments
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{PostFilter, PostView};
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
}

impl EngagementService {
    pub fn new(state: &AppState) -> Self {
        Self {
            posts: state.posts.clone(),
        }
    }

    /// Like the post, or remove the like if `actor` already likes it.
    ///
    /// A new like notifies the post owner, including when the owner likes
    /// their own post. Returns the post's likes after the change.
    pub async fn toggle_like(&self, actor: Uuid, post_id: Uuid) -> Result<Vec<Uuid>> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if self.posts.has_liked(post_id, actor).await? {
            self.posts.unlike(post_id, actor).await?;
            tracing::info!(user_id = %actor, post_id = %post_id, "post unliked");
        } else {
            self.posts.like(post_id, actor, post.user_id).await?;
            tracing::info!(user_id = %actor, post_id = %post_id, "post liked");
        }

        Ok(self.posts.likes(post_id).await?)
    }

    /// Append a comment and return the updated post. Comments do not notify.
    pub async fn comment(&self, actor: Uuid, post_id: Uuid, text: &str) -> Result<PostView> {
        if text.is_empty() {
            return Err(AppError::validation("Text field is required"));
        }

        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(AppError::not_found("Post not found"));
        }

        self.posts.add_comment(post_id, actor, text).await?;
        tracing::info!(user_id = %actor, post_id = %post_id, "comment added");

        self.posts
            .list(PostFilter::Id(post_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Post not found"))
    }
}
