//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Storefront base URL (default: `http://127.0.0.1:8080`)
//! - `CART_DIR` - Directory holding the durable cart (default: `.dharma`)
//! - `CLIENT_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CART_DIR: &str = ".dharma";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront backend
    pub backend_url: Url,
    /// Directory for durable client state
    pub cart_dir: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let backend_url = parse_backend_url(&get_env_or_default("BACKEND_URL", DEFAULT_BACKEND_URL))?;
        let cart_dir = PathBuf::from(get_env_or_default("CART_DIR", DEFAULT_CART_DIR));
        let timeout_secs = get_env_or_default("CLIENT_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CLIENT_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            backend_url,
            cart_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse the backend URL, requiring an http(s) scheme.
fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), msg);
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url)
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
