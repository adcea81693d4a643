//! Microblog service library
//!
//! Users, posts, likes, comments, follows and notifications served as a JSON
//! REST API. The binary in `main.rs` wires these modules to PostgreSQL and S3;
//! tests wire them to in-memory stores.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
