//! Credential primitives shared by the microblog services
//!
//! - `jwt`: session token issuance and validation
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError};
pub use password::PasswordError;
