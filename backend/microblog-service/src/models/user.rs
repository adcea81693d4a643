use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

/// A user row together with its derived edge sets
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_img: String,
    pub cover_img: String,
    pub bio: String,
    pub link: String,
    /// Users following this user
    pub followers: Vec<Uuid>,
    /// Users this user follows
    pub following: Vec<Uuid>,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub profile_img: String,
    pub cover_img: String,
    pub bio: String,
    pub link: String,
    pub liked_posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            followers: user.followers,
            following: user.following,
            profile_img: user.profile_img,
            cover_img: user.cover_img,
            bio: user.bio,
            link: user.link,
            liked_posts: user.liked_posts,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Author or commenter identity embedded in post payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_img: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            profile_img: user.profile_img.clone(),
        }
    }
}

/// Fields for a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile columns to overwrite; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email format"),
        custom(function = "validate_email_domain")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl SignupRequest {
    pub fn has_missing_fields(&self) -> bool {
        [&self.full_name, &self.username, &self.email, &self.password]
            .iter()
            .any(|field| field.is_empty())
    }
}

/// Well-formed address whose domain has a dot with a label on each side
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email() && has_dotted_domain(email)
}

fn has_dotted_domain(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => {
            domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}

fn validate_email_domain(email: &str) -> Result<(), ValidationError> {
    if has_dotted_domain(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email_domain").with_message("Invalid email format".into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}
