//! # Currency Conversions
//!
//! Conversion records attached to a booking by the pricing service.
//! Only the `AmountRequiredReferenceCurrency` record fixes the payable amount.

use crate::booking::BookingDetails;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Tag on a conversion record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    AmountRequired,
    AmountRequiredReferenceCurrency,
    AmountPaid,
    AmountPaidReferenceCurrency,
    Other(String),
}

impl ConversionType {
    /// Parse the backend's `conversion_type` tag
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "amount_required" => ConversionType::AmountRequired,
            "amount_required_reference_currency" => {
                ConversionType::AmountRequiredReferenceCurrency
            }
            "amount_paid" => ConversionType::AmountPaid,
            "amount_paid_reference_currency" => ConversionType::AmountPaidReferenceCurrency,
            other => ConversionType::Other(other.to_string()),
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, ConversionType::AmountRequiredReferenceCurrency)
    }
}

/// A currency conversion attached to a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub original: Money,
    pub converted: Money,
    pub exchange_rate: f64,
    pub conversion_type: ConversionType,
}

impl Conversion {
    /// Amount the guest is asked to pay
    pub fn payable(&self) -> Money {
        self.converted
    }

    pub fn payable_currency(&self) -> Currency {
        self.converted.currency
    }
}

/// Result of a conversion fetch: booking snapshot plus its conversions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSnapshot {
    pub booking: BookingDetails,
    #[serde(default)]
    pub conversions: Vec<Conversion>,
}

impl ConversionSnapshot {
    pub fn authoritative(&self) -> Option<&Conversion> {
        authoritative_conversion(&self.conversions)
    }
}

/// The one conversion whose tag marks the finalized payable amount.
///
/// Both "stop polling" and "may proceed to payment" are decided here.
pub fn authoritative_conversion(conversions: &[Conversion]) -> Option<&Conversion> {
    conversions
        .iter()
        .find(|c| c.conversion_type.is_authoritative())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion(tag: &str) -> Conversion {
        Conversion {
            original: Money::from_minor(59625, Currency::XAF),
            converted: Money::from_minor(9850, Currency::USD),
            exchange_rate: 0.001652,
            conversion_type: ConversionType::from_tag(tag),
        }
    }

    #[test]
    fn test_only_reference_tag_is_authoritative() {
        let informational = vec![conversion("amount_required"), conversion("amount_paid")];
        assert!(authoritative_conversion(&informational).is_none());

        let mut all = informational.clone();
        all.push(conversion("amount_required_reference_currency"));
        let found = authoritative_conversion(&all).unwrap();
        assert_eq!(found.payable(), Money::from_minor(9850, Currency::USD));
    }

    #[test]
    fn test_unknown_tags_preserved() {
        assert_eq!(
            ConversionType::from_tag("estimate"),
            ConversionType::Other("estimate".to_string())
        );
        assert!(!ConversionType::from_tag("estimate").is_authoritative());
    }
}
