//! # Mobile Money Gateway
//!
//! Collection requests against the mobile-money aggregator. A collection
//! prompts the payer on their handset; the booking backend learns the
//! outcome from the aggregator and flips the booking to Paid/Confirmed,
//! which the payment step discovers by polling the booking.

use crate::config::MobileMoneyConfig;
use crate::wire::{decimal, WireErrorBody};
use async_trait::async_trait;
use desk_core::{DeskError, DeskResult, PaymentGateway, PaymentInitiation, PaymentInitiationResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Mobile-money collection gateway
pub struct MobileMoneyGateway {
    config: MobileMoneyConfig,
    client: Client,
}

impl MobileMoneyGateway {
    /// Create a new gateway client
    pub fn new(config: MobileMoneyConfig) -> DeskResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeskError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> DeskResult<Self> {
        Self::new(MobileMoneyConfig::from_env()?)
    }
}

#[async_trait]
impl PaymentGateway for MobileMoneyGateway {
    #[instrument(skip(self, request), fields(reference = %request.payment_reference))]
    async fn initiate(&self, request: &PaymentInitiation) -> DeskResult<PaymentInitiationResult> {
        let url = format!("{}/collections", self.config.base_url);

        let body = CollectionRequest {
            amount: decimal(&request.amount),
            currency: request.amount.currency.as_str(),
            from: request.payee.e164().trim_start_matches('+').to_string(),
            external_reference: &request.payment_reference,
            destination_account: &self.config.destination_account,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskError::Network(format!("mobile money: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeskError::Network(format!("mobile money: {}", e)))?;

        if status.is_server_error() {
            warn!("Gateway unavailable: {}", status);
            return Err(DeskError::Network(format!("mobile money: HTTP {}", status)));
        }

        if status.is_client_error() {
            let message = serde_json::from_str::<WireErrorBody>(&text)
                .ok()
                .and_then(WireErrorBody::text)
                .unwrap_or_else(|| format!("Payment declined (HTTP {})", status));
            error!("Collection declined: {}", message);
            return Ok(PaymentInitiationResult::Declined { message });
        }

        let parsed: CollectionResponse = serde_json::from_str(&text).map_err(|e| {
            DeskError::Serialization(format!("Failed to parse collection response: {}", e))
        })?;

        match (parsed.success, parsed.transaction_id) {
            (true, Some(transaction_id)) => {
                info!("Collection accepted: {}", transaction_id);
                Ok(PaymentInitiationResult::Accepted { transaction_id })
            }
            (true, None) => Err(DeskError::Serialization(
                "Collection accepted without a transaction id".to_string(),
            )),
            (false, _) => {
                let message = parsed
                    .message
                    .unwrap_or_else(|| "Payment declined".to_string());
                warn!("Collection declined: {}", message);
                Ok(PaymentInitiationResult::Declined { message })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mobile_money"
    }
}

// =============================================================================
// Gateway API Types (internal)
// =============================================================================

#[derive(Debug, Serialize)]
struct CollectionRequest<'a> {
    amount: String,
    currency: &'static str,
    from: String,
    external_reference: &'a str,
    destination_account: &'a str,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name() {
        let gateway =
            MobileMoneyGateway::new(MobileMoneyConfig::new("https://momo.test", "k", "acct"))
                .unwrap();
        assert_eq!(gateway.provider_name(), "mobile_money");
    }

    #[test]
    fn test_collection_response_defaults() {
        let parsed: CollectionResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.success);
        assert!(parsed.transaction_id.is_none());
    }
}
