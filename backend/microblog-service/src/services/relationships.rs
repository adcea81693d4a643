/// Follow graph operations
use crate::db::{RelationshipRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// How many users `suggested` returns at most
pub const SUGGESTION_LIMIT: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
}

impl FollowOutcome {
    pub fn message(self) -> &'static str {
        match self {
            FollowOutcome::Followed => "User followed successfully",
            FollowOutcome::Unfollowed => "User unfollowed successfully",
        }
    }
}

pub struct RelationshipService {
    users: Arc<dyn UserRepository>,
    relationships: Arc<dyn RelationshipRepository>,
}

impl RelationshipService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            relationships: state.relationships.clone(),
        }
    }

    /// Follow `target` if `actor` does not follow them yet, otherwise unfollow.
    ///
    /// Only the follow direction creates a notification.
    pub async fn toggle_follow(&self, actor: Uuid, target: Uuid) -> Result<FollowOutcome> {
        if actor == target {
            return Err(AppError::InvalidOperation(
                "You can't follow/unfollow yourself".to_string(),
            ));
        }

        if !self.users.exists(actor).await? || !self.users.exists(target).await? {
            return Err(AppError::not_found("User not found"));
        }

        if self.relationships.is_following(actor, target).await? {
            self.relationships.unfollow(actor, target).await?;
            tracing::info!(actor = %actor, target = %target, "user unfollowed");
            Ok(FollowOutcome::Unfollowed)
        } else {
            let created = self.relationships.follow(actor, target).await?;
            tracing::info!(actor = %actor, target = %target, created, "user followed");
            Ok(FollowOutcome::Followed)
        }
    }

    pub async fn profile(&self, username: &str) -> Result<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Up to four random users that `actor` does not follow yet
    pub async fn suggested(&self, actor: Uuid) -> Result<Vec<User>> {
        Ok(self.users.suggested(actor, SUGGESTION_LIMIT).await?)
    }
}
