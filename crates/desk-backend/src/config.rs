//! # Backend Configuration
//!
//! Configuration for the booking backend and the mobile-money gateway.
//! All secrets are loaded from environment variables.

use desk_core::DeskError;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Booking backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// REST API root (e.g. `https://api.hotel.example/api/v1`)
    pub base_url: String,

    /// Bearer token issued by the session service
    pub api_token: String,

    /// Hotel the desk works for
    pub hotel_id: u64,

    /// Per-request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `DESK_BACKEND_URL`
    /// - `DESK_API_TOKEN`
    /// - `DESK_HOTEL_ID`
    ///
    /// Optional: `DESK_HTTP_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self, DeskError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("DESK_BACKEND_URL")
            .map_err(|_| DeskError::Configuration("DESK_BACKEND_URL not set".to_string()))?;

        let api_token = env::var("DESK_API_TOKEN")
            .map_err(|_| DeskError::Configuration("DESK_API_TOKEN not set".to_string()))?;

        let hotel_id = env::var("DESK_HOTEL_ID")
            .map_err(|_| DeskError::Configuration("DESK_HOTEL_ID not set".to_string()))?
            .parse()
            .map_err(|_| DeskError::Configuration("DESK_HOTEL_ID must be a number".to_string()))?;

        let timeout = env::var("DESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            hotel_id,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>, hotel_id: u64) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            hotel_id,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Check URL scheme and token presence
    pub fn validate(&self) -> Result<(), DeskError> {
        validate_url("DESK_BACKEND_URL", &self.base_url)?;
        if self.api_token.trim().is_empty() {
            return Err(DeskError::Configuration(
                "DESK_API_TOKEN must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token)
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Mobile-money gateway configuration
#[derive(Debug, Clone)]
pub struct MobileMoneyConfig {
    /// Gateway API root
    pub base_url: String,

    /// Gateway API key
    pub api_key: String,

    /// Merchant wallet receiving the funds
    pub destination_account: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl MobileMoneyConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `MOMO_BASE_URL`
    /// - `MOMO_API_KEY`
    /// - `MOMO_DESTINATION_ACCOUNT`
    pub fn from_env() -> Result<Self, DeskError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("MOMO_BASE_URL")
            .map_err(|_| DeskError::Configuration("MOMO_BASE_URL not set".to_string()))?;

        let api_key = env::var("MOMO_API_KEY")
            .map_err(|_| DeskError::Configuration("MOMO_API_KEY not set".to_string()))?;

        let destination_account = env::var("MOMO_DESTINATION_ACCOUNT").map_err(|_| {
            DeskError::Configuration("MOMO_DESTINATION_ACCOUNT not set".to_string())
        })?;

        validate_url("MOMO_BASE_URL", &base_url)?;

        Ok(Self::new(base_url, api_key, destination_account))
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        destination_account: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            destination_account: destination_account.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn auth_header(&self) -> String {
        format!("Token {}", self.api_key)
    }
}

fn validate_url(var: &str, url: &str) -> Result<(), DeskError> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(DeskError::Configuration(format!(
            "{} must start with http:// or https://",
            var
        )));
    }
    Ok(())
}
