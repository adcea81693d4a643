//! Shared application state handed to every handler

use crate::db::{
    HealthProbe, NotificationRepository, PgStore, PostRepository, RelationshipRepository,
    UserRepository,
};
use crate::media::MediaStore;
use actix_middleware::{IdentityResolver, ResolveError};
use std::sync::Arc;
use uuid::Uuid;

/// Session cookie attributes that vary by environment
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub relationships: Arc<dyn RelationshipRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub health: Arc<dyn HealthProbe>,
    pub media: Arc<dyn MediaStore>,
    pub cookies: CookieSettings,
}

impl AppState {
    /// Build the state from one store implementing every repository
    pub fn from_store<S>(store: Arc<S>, media: Arc<dyn MediaStore>, cookies: CookieSettings) -> Self
    where
        S: UserRepository
            + RelationshipRepository
            + PostRepository
            + NotificationRepository
            + HealthProbe
            + 'static,
    {
        Self {
            users: store.clone(),
            relationships: store.clone(),
            posts: store.clone(),
            notifications: store.clone(),
            health: store,
            media,
            cookies,
        }
    }

    pub fn postgres(pool: sqlx::PgPool, media: Arc<dyn MediaStore>, cookies: CookieSettings) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)), media, cookies)
    }

    /// Identity lookup used by the session gate
    pub fn identity_resolver(&self) -> Arc<dyn IdentityResolver> {
        Arc::new(UserIdentityResolver {
            users: self.users.clone(),
        })
    }
}

/// Confirms that a session's user still exists
struct UserIdentityResolver {
    users: Arc<dyn UserRepository>,
}

#[async_trait::async_trait]
impl IdentityResolver for UserIdentityResolver {
    async fn identity_exists(&self, user_id: Uuid) -> Result<bool, ResolveError> {
        Ok(self.users.exists(user_id).await?)
    }
}
