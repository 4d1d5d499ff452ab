//! # Phone Numbers
//!
//! Guest contact numbers in international form. The national part is
//! checked against the length rule of the detected country calling code.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};

/// Calling code, country, national number length
const NATIONAL_LENGTHS: &[(&str, &str, usize)] = &[
    ("1", "US/CA", 10),
    ("33", "FR", 9),
    ("44", "GB", 10),
    ("49", "DE", 11),
    ("221", "SN", 9),
    ("225", "CI", 10),
    ("233", "GH", 9),
    ("234", "NG", 10),
    ("235", "TD", 8),
    ("236", "CF", 8),
    ("237", "CM", 9),
    ("240", "GQ", 9),
    ("241", "GA", 8),
    ("242", "CG", 9),
    ("243", "CD", 9),
    ("250", "RW", 9),
    ("254", "KE", 9),
    ("255", "TZ", 9),
    ("256", "UG", 9),
];

/// A validated international phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    country_code: String,
    national: String,
}

impl PhoneNumber {
    /// Parse `+237 6 71 23 45 67`, `00237671234567` or `237671234567`.
    ///
    /// The calling code is detected by longest prefix; the remaining digits
    /// must match that country's national length.
    pub fn parse(raw: &str) -> DeskResult<Self> {
        let trimmed = raw.trim();
        let without_plus = trimmed
            .strip_prefix('+')
            .or_else(|| trimmed.strip_prefix("00"))
            .unwrap_or(trimmed);

        let digits: String = without_plus
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DeskError::validation(
                "phone",
                "phone number may only contain digits",
            ));
        }

        let (code, _, length) = NATIONAL_LENGTHS
            .iter()
            .filter(|(code, _, _)| digits.starts_with(code))
            .max_by_key(|(code, _, _)| code.len())
            .ok_or_else(|| DeskError::validation("phone", "unknown country calling code"))?;

        let national = &digits[code.len()..];
        if national.len() != *length {
            return Err(DeskError::validation(
                "phone",
                format!(
                    "numbers for +{} need {} digits after the country code, got {}",
                    code,
                    length,
                    national.len()
                ),
            ));
        }

        Ok(Self {
            country_code: code.to_string(),
            national: national.to_string(),
        })
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn national(&self) -> &str {
        &self.national
    }

    /// ISO country for the calling code
    pub fn country(&self) -> Option<&'static str> {
        NATIONAL_LENGTHS
            .iter()
            .find(|(code, _, _)| *code == self.country_code)
            .map(|(_, country, _)| *country)
    }

    /// E.164 form, e.g. `+237671234567`
    pub fn e164(&self) -> String {
        format!("+{}{}", self.country_code, self.national)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.e164())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        for raw in ["+237 671 23 45 67", "00237671234567", "237-671-234-567"] {
            let phone = PhoneNumber::parse(raw).unwrap();
            assert_eq!(phone.country_code(), "237");
            assert_eq!(phone.national(), "671234567");
            assert_eq!(phone.e164(), "+237671234567");
            assert_eq!(phone.country(), Some("CM"));
        }
    }

    #[test]
    fn test_length_rule_per_country() {
        assert!(PhoneNumber::parse("+23767123456").is_err());
        assert!(PhoneNumber::parse("+2348012345678").is_ok());
        assert!(PhoneNumber::parse("+234801234567").is_err());
    }

    #[test]
    fn test_other_countries() {
        let chad = PhoneNumber::parse("+235 66 12 34 56").unwrap();
        assert_eq!(chad.country(), Some("TD"));

        let france = PhoneNumber::parse("+33 6 12 34 56 78").unwrap();
        assert_eq!(france.country(), Some("FR"));
        assert_eq!(france.national(), "612345678");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(PhoneNumber::parse("").is_err());
        assert!(PhoneNumber::parse("call me").is_err());
        assert!(PhoneNumber::parse("+999123456").is_err());
    }
}
