/// Signup, login and session identity
use crate::db::UserRepository;
use crate::error::{first_message, AppError, Result};
use crate::models::{LoginRequest, NewUser, SignupRequest, User};
use crate::state::AppState;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
        }
    }

    /// Register a new user. Nothing is written unless every check passes.
    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        if req.has_missing_fields() {
            return Err(AppError::validation("All fields are required"));
        }

        if let Err(errors) = req.validate() {
            return Err(AppError::Validation(first_message(
                &errors,
                &["email", "password"],
            )));
        }

        if self.users.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::validation("Username is already taken"));
        }

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::validation("Email is already taken"));
        }

        let password_hash = crypto_core::password::hash_password(&req.password)?;

        let user = self
            .users
            .create(NewUser {
                full_name: req.full_name,
                username: req.username,
                email: req.email,
                password_hash,
            })
            .await
            .map_err(unique_violation_as_validation)?;

        tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<User> {
        let Some(user) = self.users.find_by_username(&req.username).await? else {
            tracing::debug!(username = %req.username, "login for unknown user");
            return Err(AppError::validation(INVALID_CREDENTIALS));
        };

        if !crypto_core::password::verify_password(&req.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "login with wrong password");
            return Err(AppError::validation(INVALID_CREDENTIALS));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// The user behind the current session.
    ///
    /// The account can disappear between the session gate and this lookup;
    /// that is reported the same way the gate reports it.
    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Unauthorized: User not found".into()))
    }
}

/// A concurrent signup can still win the race past the lookups above
pub(crate) fn unique_violation_as_validation(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::validation("Username or email is already taken")
        }
        _ => AppError::Database(err),
    }
}
