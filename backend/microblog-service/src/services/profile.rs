/// Profile updates for the signed-in user
use super::auth::unique_violation_as_validation;
use super::delete_image_best_effort;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::models::{is_valid_email, non_empty, ProfileChanges, UpdateProfileRequest, User};
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    media: Arc<dyn MediaStore>,
}

impl ProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            media: state.media.clone(),
        }
    }

    /// Apply the non-empty fields of `req` to the user's profile.
    ///
    /// All checks run before any image is uploaded or any row is written.
    /// Replaced images are removed from the media store best-effort.
    pub async fn update(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let mut changes = ProfileChanges {
            full_name: non_empty(req.full_name),
            bio: non_empty(req.bio),
            link: non_empty(req.link),
            ..ProfileChanges::default()
        };

        match (non_empty(req.current_password), non_empty(req.new_password)) {
            (None, None) => {}
            (Some(current), Some(new)) => {
                if !crypto_core::password::verify_password(&current, &user.password_hash)? {
                    return Err(AppError::validation("Current password is incorrect"));
                }
                if new.chars().count() < MIN_PASSWORD_LEN {
                    return Err(AppError::validation(
                        "Password must be at least 6 characters long",
                    ));
                }
                changes.password_hash = Some(crypto_core::password::hash_password(&new)?);
            }
            _ => {
                return Err(AppError::validation(
                    "Please provide both current password and new password",
                ))
            }
        }

        if let Some(email) = non_empty(req.email).filter(|e| *e != user.email) {
            if !is_valid_email(&email) {
                return Err(AppError::validation("Invalid email format"));
            }
            if self.users.find_by_email(&email).await?.is_some() {
                return Err(AppError::validation("Email is already taken"));
            }
            changes.email = Some(email);
        }

        if let Some(username) = non_empty(req.username).filter(|u| *u != user.username) {
            if self.users.find_by_username(&username).await?.is_some() {
                return Err(AppError::validation("Username is already taken"));
            }
            changes.username = Some(username);
        }

        let new_profile_img = match non_empty(req.profile_img) {
            Some(payload) => Some(self.media.upload(&payload).await?),
            None => None,
        };
        let new_cover_img = match non_empty(req.cover_img) {
            Some(payload) => Some(self.media.upload(&payload).await?),
            None => None,
        };

        let replaced: Vec<&str> = [
            (new_profile_img.is_some(), user.profile_img.as_str()),
            (new_cover_img.is_some(), user.cover_img.as_str()),
        ]
        .into_iter()
        .filter(|(changed, old)| *changed && !old.is_empty())
        .map(|(_, old)| old)
        .collect();
        changes.profile_img = new_profile_img;
        changes.cover_img = new_cover_img;

        let updated = self
            .users
            .update_profile(user_id, changes)
            .await
            .map_err(unique_violation_as_validation)?;

        // Old images go only once the row no longer points at them
        for old in replaced {
            delete_image_best_effort(self.media.as_ref(), old).await;
        }

        tracing::info!(user_id = %user_id, "profile updated");
        Ok(updated)
    }
}
