//! # Workflow Configuration
//!
//! Poll cadence, retry bounds, the supported payee country and the hotel
//! profile, loaded from `config/workflow.toml`.

use desk_core::{DeskError, DeskResult, Hotel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONFIG_PATHS: [&str; 3] = [
    "config/workflow.toml",
    "../config/workflow.toml",
    "../../config/workflow.toml",
];

/// Polling cadence for the confirmation and payment steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between conversion fetches while the payable amount is pending
    #[serde(default = "default_conversion_interval")]
    pub conversion_interval_secs: u64,

    /// Seconds between booking fetches while a mobile payment is pending
    #[serde(default = "default_payment_interval")]
    pub payment_interval_secs: u64,

    /// Consecutive transport failures tolerated before a poll gives up
    #[serde(default = "default_max_retries")]
    pub max_transient_retries: u32,
}

fn default_conversion_interval() -> u64 {
    3
}

fn default_payment_interval() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            conversion_interval_secs: default_conversion_interval(),
            payment_interval_secs: default_payment_interval(),
            max_transient_retries: default_max_retries(),
        }
    }
}

impl PollingConfig {
    pub fn conversion_interval(&self) -> Duration {
        Duration::from_secs(self.conversion_interval_secs)
    }

    pub fn payment_interval(&self) -> Duration {
        Duration::from_secs(self.payment_interval_secs)
    }
}

/// Country whose wallets the mobile-money gateway can charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayeeConfig {
    /// Calling code without `+`
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Regex the national number must match
    #[serde(default = "default_national_pattern")]
    pub national_pattern: String,
}

fn default_country_code() -> String {
    "237".to_string()
}

fn default_national_pattern() -> String {
    "^6[0-9]{8}$".to_string()
}

impl Default for PayeeConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            national_pattern: default_national_pattern(),
        }
    }
}

/// Workflow configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub payee: PayeeConfig,

    /// Hotel profile for invoices; the id is overridden by the backend config
    #[serde(default)]
    pub hotel: Option<Hotel>,
}

impl FlowConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> DeskResult<Self> {
        toml::from_str(content)
            .map_err(|e| DeskError::Configuration(format!("Invalid workflow config: {}", e)))
    }

    /// Load from the first `config/workflow.toml` found, or fall back to defaults
    pub fn load() -> DeskResult<Self> {
        for path in CONFIG_PATHS {
            if let Ok(content) = std::fs::read_to_string(path) {
                let config = Self::from_toml_str(&content)
                    .map_err(|e| DeskError::Configuration(format!("{}: {}", path, e)))?;
                tracing::info!("Loaded workflow config from {}", path);
                return Ok(config);
            }
        }

        tracing::warn!("No workflow config found, using defaults");
        Ok(Self::default())
    }

    /// Builder: set the hotel profile
    pub fn with_hotel(mut self, hotel: Hotel) -> Self {
        self.hotel = Some(hotel);
        self
    }

    /// Builder: set the retry bound
    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.polling.max_transient_retries = retries;
        self
    }
}
