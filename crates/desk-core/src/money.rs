//! # Money Types
//!
//! Currency and amount types shared by pricing, conversion and payment.
//! Amounts are held in the smallest currency unit.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    XAF,
    XOF,
    NGN,
    GHS,
    KES,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::XAF => "XAF",
            Currency::XOF => "XOF",
            Currency::NGN => "NGN",
            Currency::GHS => "GHS",
            Currency::KES => "KES",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Parse an ISO code, case-insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "XAF" => Some(Currency::XAF),
            "XOF" => Some(Currency::XOF),
            "NGN" => Some(Currency::NGN),
            "GHS" => Some(Currency::GHS),
            "KES" => Some(Currency::KES),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            _ => None,
        }
    }

    /// Returns the number of decimal places for this currency
    /// (the CFA francs have 0 decimals, the others 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::XAF | Currency::XOF => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount in the smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    /// Create from a decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create from smallest units
    pub fn from_minor(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Parse a user-entered amount such as `"25 000"` or `"41.5"`.
    ///
    /// Rejects negatives, more fractional digits than the currency allows,
    /// and anything that is not a plain decimal number.
    pub fn parse(input: &str, currency: Currency) -> DeskResult<Self> {
        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        if cleaned.is_empty() {
            return Err(DeskError::validation("amount", "amount is required"));
        }

        let (whole, fraction) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
            return Err(DeskError::validation(
                "amount",
                format!("'{}' is not a valid amount", input.trim()),
            ));
        }

        let places = currency.decimal_places() as usize;
        if fraction.len() > places {
            return Err(DeskError::validation(
                "amount",
                format!("{} allows at most {} decimal places", currency, places),
            ));
        }

        let mut minor = String::with_capacity(whole.len() + places);
        minor.push_str(whole);
        minor.push_str(fraction);
        minor.extend(std::iter::repeat('0').take(places - fraction.len()));

        let amount = minor
            .parse::<i64>()
            .map_err(|_| DeskError::validation("amount", "amount is too large"))?;
        Ok(Self::from_minor(amount, currency))
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Multiply by a whole quantity (nights, units)
    pub fn times(&self, quantity: i64) -> DeskResult<Self> {
        self.amount
            .checked_mul(quantity)
            .map(|amount| Self::from_minor(amount, self.currency))
            .ok_or_else(|| DeskError::validation("amount", "amount is too large"))
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Format for display (e.g., "25000 XAF", "41.20 USD")
    pub fn display(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.*} {}", places, self.as_decimal(), self.currency)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
