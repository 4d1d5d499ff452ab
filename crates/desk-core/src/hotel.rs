//! # Hotel Profile
//!
//! The hotel the desk operates for. Loaded once from configuration and
//! used for availability queries and the invoice header.

use crate::money::Currency;
use serde::{Deserialize, Serialize};

/// Profile of the hotel running the desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    /// Backend identifier
    pub id: u64,

    /// Display name (e.g., "Hotel La Falaise")
    pub name: String,

    /// Postal address, printed on invoices
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Currency rooms are priced and cash is collected in
    #[serde(default)]
    pub local_currency: Currency,

    /// Currency the mobile-money gateway charges in
    #[serde(default = "default_reference_currency")]
    pub reference_currency: Currency,
}

fn default_reference_currency() -> Currency {
    Currency::USD
}

impl Hotel {
    /// Create a hotel with required fields
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            phone: None,
            email: None,
            local_currency: Currency::default(),
            reference_currency: default_reference_currency(),
        }
    }

    /// Builder: set address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builder: set phone
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Builder: set email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Builder: set local and reference currencies
    pub fn with_currencies(mut self, local: Currency, reference: Currency) -> Self {
        self.local_currency = local;
        self.reference_currency = reference;
        self
    }

    /// Contact line for invoice headers, e.g. "+237 222 000 000 · desk@hotel.cm"
    pub fn contact_line(&self) -> String {
        [self.phone.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotel_builder() {
        let hotel = Hotel::new(7, "Hotel La Falaise")
            .with_address("Bonanjo, Douala")
            .with_phone("+237 233 000 000")
            .with_email("desk@falaise.cm")
            .with_currencies(Currency::XAF, Currency::USD);

        assert_eq!(hotel.id, 7);
        assert_eq!(hotel.local_currency, Currency::XAF);
        assert_eq!(hotel.contact_line(), "+237 233 000 000 · desk@falaise.cm");
    }

    #[test]
    fn test_contact_line_partial() {
        let hotel = Hotel::new(1, "Test").with_email("a@b.c");
        assert_eq!(hotel.contact_line(), "a@b.c");
        assert_eq!(Hotel::new(2, "Bare").contact_line(), "");
    }

    #[test]
    fn test_hotel_defaults_from_json() {
        let hotel: Hotel = serde_json::from_str(r#"{"id": 3, "name": "Mini"}"#).unwrap();
        assert_eq!(hotel.local_currency, Currency::XAF);
        assert_eq!(hotel.reference_currency, Currency::USD);
    }
}
