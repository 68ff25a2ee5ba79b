//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8080)
//! - `STOREFRONT_PAGE_SIZE` - Products per listing page (default: 6, max 100)
//! - `CORS_ORIGIN` - Allowed browser origin (default: any)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default number of products per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Largest page size the listing accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Listing page size, fixed for the lifetime of the process
    pub page_size: u32,
    /// Browser origin allowed by CORS; `None` allows any origin
    pub cors_origin: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let page_size = parse_page_size(&get_env_or_default(
            "STOREFRONT_PAGE_SIZE",
            &DEFAULT_PAGE_SIZE.to_string(),
        ))?;

        Ok(Self {
            database_url,
            host,
            port,
            page_size,
            cors_origin: get_optional_env("CORS_ORIGIN"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and range-check the listing page size.
fn parse_page_size(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("STOREFRONT_PAGE_SIZE".to_string(), msg);
    let size = raw.parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(invalid(format!("must be between 1 and {MAX_PAGE_SIZE}")));
    }
    Ok(size)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_default_parses() {
        assert_eq!(
            parse_page_size(&DEFAULT_PAGE_SIZE.to_string()).unwrap(),
            DEFAULT_PAGE_SIZE
        );
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("101").is_err());
        assert!(parse_page_size("ten").is_err());
        assert_eq!(parse_page_size("100").unwrap(), 100);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            page_size: DEFAULT_PAGE_SIZE,
            cors_origin: None,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://admin:hunter2@db/catalog"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            page_size: 10,
            cors_origin: Some("https://shop.example".to_string()),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("shop.example"));
        assert!(!debug_output.contains("hunter2"));
    }
}
