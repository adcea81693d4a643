//! # Actix Middleware Library
//!
//! Middleware components shared by microblog HTTP services
//!
//! ## Modules
//! - `session_auth`: cookie session gate that resolves the caller's identity
//! - `metrics`: Prometheus metrics middleware

pub mod metrics;
pub mod session_auth;

pub use metrics::{render_metrics, MetricsMiddleware};
pub use session_auth::{
    IdentityResolver, ResolveError, SessionAuth, UserId, SESSION_COOKIE,
};
