/// Configuration management for the microblog service
///
/// Everything is read from environment variables (after `dotenvy` has loaded
/// a `.env` file, if present). Database and S3 settings live in their own
/// crates and are loaded by `db_pool::DbConfig` and `s3_utils::S3Config`.
use serde::{Deserialize, Serialize};

/// Shortest signing secret accepted outside development
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    pub allowed_origins: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// Limits on uploaded images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Largest decoded image accepted, in bytes
    pub max_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config {
            app: AppConfig {
                env,
                host: std::env::var("MICROBLOG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("MICROBLOG_PORT", 5000)?,
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: std::env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            },
            media: MediaConfig {
                max_bytes: parse_or("MEDIA_MAX_BYTES", 5 * 1024 * 1024)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        if !self.is_development() && self.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_BYTES} bytes"),
            });
        }

        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            return Err(ConfigError::Invalid {
                name: "CORS_ALLOWED_ORIGINS",
                reason: "wildcard origin is not allowed in production".to_string(),
            });
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.app.env == "development"
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }

    /// Session cookies are marked `Secure` everywhere but development
    pub fn secure_cookies(&self) -> bool {
        !self.is_development()
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors
            .allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("cannot parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "APP_ENV",
        "MICROBLOG_HOST",
        "MICROBLOG_PORT",
        "CORS_ALLOWED_ORIGINS",
        "JWT_SECRET",
        "MEDIA_MAX_BYTES",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_in_development() {
        clear();
        std::env::set_var("JWT_SECRET", "dev");

        let config = Config::from_env().unwrap();
        assert!(config.is_development());
        assert!(!config.secure_cookies());
        assert_eq!(config.app.port, 5000);
        assert_eq!(config.cors_origins(), vec!["http://localhost:3000"]);
        assert_eq!(config.media.max_bytes, 5 * 1024 * 1024);

        clear();
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_rejected() {
        clear();
        assert_eq!(
            Config::from_env().unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    #[serial]
    fn test_short_secret_rejected_outside_development() {
        clear();
        std::env::set_var("APP_ENV", "staging");
        std::env::set_var("JWT_SECRET", "too-short");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "JWT_SECRET", .. })
        ));

        clear();
    }

    #[test]
    #[serial]
    fn test_production_refuses_wildcard_cors() {
        clear();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("JWT_SECRET", "0123456789abcdef0123456789abcdef");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://microblog.dev, *");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "CORS_ALLOWED_ORIGINS", .. })
        ));

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://microblog.dev");
        let config = Config::from_env().unwrap();
        assert!(config.secure_cookies());

        clear();
    }

    #[test]
    #[serial]
    fn test_bad_port_is_an_error() {
        clear();
        std::env::set_var("JWT_SECRET", "dev");
        std::env::set_var("MICROBLOG_PORT", "http");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "MICROBLOG_PORT", .. })
        ));

        clear();
    }
}
