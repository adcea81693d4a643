/// Session token module for microblog services
///
/// Session tokens are HS256-signed JWTs carrying the user id as `sub`.
/// They are delivered to browsers in an http-only cookie and live for
/// 15 days.
///
/// ## Usage
///
/// Services must call `initialize_jwt_secret()` during startup before any JWT operations:
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET required");
/// jwt::initialize_jwt_secret(&secret).expect("Failed to initialize JWT secret");
///
/// let token = jwt::generate_session_token(user_id)?;
/// let user_id = jwt::get_user_id_from_token(&token)?;
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Lifetime of a session token (and of the cookie carrying it)
pub const SESSION_TOKEN_EXPIRY_DAYS: i64 = 15;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret not initialized")]
    NotInitialized,
    #[error("JWT secret already initialized")]
    AlreadyInitialized,
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("token validation failed: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token subject is not a valid user id")]
    MalformedSubject,
}

// ============================================================================
// Key Storage
// ============================================================================

/// Keys are initialized once at startup and never modified.
static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Initialize the signing secret
///
/// Can only be called once; subsequent calls return `AlreadyInitialized`.
pub fn initialize_jwt_secret(secret: &str) -> Result<(), JwtError> {
    if secret.is_empty() {
        return Err(JwtError::EmptySecret);
    }

    JWT_ENCODING_KEY
        .set(EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|_| JwtError::AlreadyInitialized)?;

    JWT_DECODING_KEY
        .set(DecodingKey::from_secret(secret.as_bytes()))
        .map_err(|_| JwtError::AlreadyInitialized)?;

    Ok(())
}

/// Whether `initialize_jwt_secret` has completed
pub fn is_initialized() -> bool {
    JWT_DECODING_KEY.get().is_some()
}

fn get_encoding_key() -> Result<&'static EncodingKey, JwtError> {
    JWT_ENCODING_KEY.get().ok_or(JwtError::NotInitialized)
}

fn get_decoding_key() -> Result<&'static DecodingKey, JwtError> {
    JWT_DECODING_KEY.get().ok_or(JwtError::NotInitialized)
}

// ============================================================================
// Token Generation
// ============================================================================

/// Generate a session token valid for `SESSION_TOKEN_EXPIRY_DAYS`
pub fn generate_session_token(user_id: Uuid) -> Result<String, JwtError> {
    generate_token_with_ttl(user_id, session_ttl())
}

/// Generate a token with an explicit lifetime.
///
/// A negative `ttl` yields an already-expired token.
pub fn generate_token_with_ttl(user_id: Uuid, ttl: Duration) -> Result<String, JwtError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, get_encoding_key()?).map_err(JwtError::Encoding)
}

/// Session lifetime as a duration
fn session_ttl() -> Duration {
    Duration::days(SESSION_TOKEN_EXPIRY_DAYS)
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate signature and expiry, returning the decoded claims
pub fn validate_token(token: &str) -> Result<TokenData<Claims>, JwtError> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, get_decoding_key()?, &validation).map_err(JwtError::Invalid)
}

/// Extract user ID from a validated token
pub fn get_user_id_from_token(token: &str) -> Result<Uuid, JwtError> {
    let token_data = validate_token(token)?;
    Uuid::parse_str(&token_data.claims.sub).map_err(|_| JwtError::MalformedSubject)
}

// ============================================================================
// Tests
// ============================================================================
