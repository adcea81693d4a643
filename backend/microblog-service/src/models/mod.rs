//! Data models for the microblog service
//!
//! Row types (`User`, `Post`, `Comment`, `Notification`) map database rows;
//! view types are what the API serializes, with camelCase field names and
//! never a password hash.

pub mod notification;
pub mod post;
pub mod user;

pub use notification::{Notification, NotificationKind, NotificationSender, NotificationView};
pub use post::{
    Comment, CommentRequest, CommentView, CreatePostRequest, Post, PostFilter, PostView,
};
pub use user::{
    is_valid_email, LoginRequest, NewUser, ProfileChanges, PublicUser, SignupRequest,
    UpdateProfileRequest, User, UserSummary,
};

/// Treat `Some("")` the same as an absent field
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
