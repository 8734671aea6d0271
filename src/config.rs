//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. `.env` file (if present)
//! 3. Configuration files (config/default.toml, config/local.toml)
//! 4. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Token signing and verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret
    pub jwt_secret: String,
    /// Expected `iss` claim
    pub jwt_issuer: String,
    /// Expected `aud` claim
    pub jwt_audience: String,
    /// Lifetime stamped into the `expiration` claim of issued tokens.
    /// Tokens carry no expiration when unset.
    #[serde(default)]
    pub token_ttl_seconds: Option<i64>,
    /// Reject tokens whose `expiration` claim has passed.
    #[serde(default)]
    pub enforce_expiration: bool,
    /// bcrypt work factor for stored passwords
    pub bcrypt_cost: u32,
}

/// Bookmark upload settings
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory for spooling uploaded files before parsing
    pub temp_dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of per-user bookmark listings kept in memory
    pub bookmark_lists_max_users: u64,
    /// Listing TTL in seconds
    pub ttl_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (KWIKPORTAL__*), including those from `.env`
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                return Err(crate::error::AppError::Config(error.to_string()));
            }
        }

        let temp_dir = std::env::temp_dir();

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("database.path", "data/kwikportal.db")?
            .set_default("auth.enforce_expiration", false)?
            // bcrypt minimum
            .set_default("auth.bcrypt_cost", 4)?
            .set_default("upload.temp_dir", temp_dir.to_string_lossy().to_string())?
            .set_default("upload.max_bytes", 10 * 1024 * 1024)?
            .set_default("cache.bookmark_lists_max_users", 1000)?
            .set_default("cache.ttl_seconds", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (KWIKPORTAL__*)
            .add_source(
                Environment::with_prefix("KWIKPORTAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        let required = [
            ("auth.jwt_secret", &self.auth.jwt_secret),
            ("auth.jwt_issuer", &self.auth.jwt_issuer),
            ("auth.jwt_audience", &self.auth.jwt_audience),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "{key} must not be empty"
                )));
            }
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(crate::error::AppError::Config(
                "auth.bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }

        if matches!(self.auth.token_ttl_seconds, Some(ttl) if ttl <= 0) {
            return Err(crate::error::AppError::Config(
                "auth.token_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.upload.max_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "upload.max_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_seconds: 30,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/kwikportal-test.db"),
            },
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                jwt_issuer: "kwikportal".to_string(),
                jwt_audience: "kwikportal-web".to_string(),
                token_ttl_seconds: None,
                enforce_expiration: false,
                bcrypt_cost: 4,
            },
            upload: UploadConfig {
                temp_dir: std::env::temp_dir(),
                max_bytes: 1024,
            },
            cache: CacheConfig {
                bookmark_lists_max_users: 100,
                ttl_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let mut config = valid_config();
        config.auth.jwt_secret = "  ".to_string();

        let error = config.validate().expect_err("empty secret must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("auth.jwt_secret")
        ));
    }

    #[test]
    fn validate_rejects_empty_audience() {
        let mut config = valid_config();
        config.auth.jwt_audience = String::new();

        let error = config.validate().expect_err("empty audience must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("auth.jwt_audience")
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_bcrypt_cost() {
        let mut config = valid_config();
        config.auth.bcrypt_cost = 3;
        assert!(config.validate().is_err());

        config.auth.bcrypt_cost = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_ttl() {
        let mut config = valid_config();
        config.auth.token_ttl_seconds = Some(0);
        assert!(config.validate().is_err());
    }
}
