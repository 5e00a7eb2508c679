//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTWHEEL_API_URL` - Base URL of the remote commerce API
//!   (e.g., `https://shop.example.com/api`)
//!
//! ## Optional
//! - `CARTWHEEL_STATE_FILE` - Path of the local state file holding
//!   credentials and cart shadow copies (default: `.cartwheel/state.json`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Default location of the local state file, relative to the working
/// directory.
const DEFAULT_STATE_FILE: &str = ".cartwheel/state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote commerce API.
    pub api_url: Url,
    /// Path of the local state file (credentials + cart shadow cache).
    pub state_file: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = require_env("CARTWHEEL_API_URL")?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CARTWHEEL_API_URL".to_string(), e.to_string())
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_API_URL".to_string(),
                "not a base URL".to_string(),
            ));
        }

        let state_file = std::env::var("CARTWHEEL_STATE_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);

        Ok(Self {
            api_url,
            state_file,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
