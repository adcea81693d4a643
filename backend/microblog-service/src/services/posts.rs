/// Post creation, deletion and listings
use super::delete_image_best_effort;
use crate::db::{PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::models::{non_empty, CreatePostRequest, PostFilter, PostView};
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

pub struct PostService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
            media: state.media.clone(),
        }
    }

    /// Create a post with text, an image, or both. The image is uploaded
    /// before the post is stored and the post keeps its public URL.
    pub async fn create(&self, actor: Uuid, req: CreatePostRequest) -> Result<PostView> {
        let text = non_empty(req.text);
        let img = non_empty(req.img);

        if text.is_none() && img.is_none() {
            return Err(AppError::validation("Post must have text or image"));
        }

        if !self.users.exists(actor).await? {
            return Err(AppError::not_found("User not found"));
        }

        let img = match img {
            Some(payload) => Some(self.media.upload(&payload).await?),
            None => None,
        };

        let post = self.posts.create(actor, text, img).await?;
        tracing::info!(user_id = %actor, post_id = %post.id, "post created");

        self.view(post.id).await
    }

    /// Delete a post owned by `actor`. The stored image is removed
    /// best-effort first; a failure there does not stop the delete.
    pub async fn delete(&self, actor: Uuid, post_id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if post.user_id != actor {
            tracing::warn!(user_id = %actor, post_id = %post_id, "delete of someone else's post");
            return Err(AppError::forbidden(
                "You are not authorized to delete this post",
            ));
        }

        if let Some(img) = post.img.as_deref() {
            delete_image_best_effort(self.media.as_ref(), img).await;
        }

        self.posts.delete(post_id).await?;
        tracing::info!(user_id = %actor, post_id = %post_id, "post deleted");
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<PostView>> {
        Ok(self.posts.list(PostFilter::All).await?)
    }

    pub async fn by_username(&self, username: &str) -> Result<Vec<PostView>> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(self.posts.list(PostFilter::Author(user.id)).await?)
    }

    pub async fn liked_by(&self, user_id: Uuid) -> Result<Vec<PostView>> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }

        Ok(self.posts.list(PostFilter::LikedBy(user_id)).await?)
    }

    /// Posts by everyone `actor` follows
    pub async fn following_feed(&self, actor: Uuid) -> Result<Vec<PostView>> {
        if !self.users.exists(actor).await? {
            return Err(AppError::not_found("User not found"));
        }

        Ok(self.posts.list(PostFilter::FollowedBy(actor)).await?)
    }

    async fn view(&self, post_id: Uuid) -> Result<PostView> {
        self.posts
            .list(PostFilter::Id(post_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Post not found"))
    }
}
