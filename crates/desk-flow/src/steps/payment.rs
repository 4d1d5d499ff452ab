//! Step 4: collect payment, by mobile money or cash at the desk.
//!
//! Mobile sub-flow:
//!
//! ```text
//!  Idle ──initiate──▶ Initiating ──accepted──▶ Pending ──paid+confirmed──▶ Success
//!   ▲                     │                       │
//!   │                     ▼ declined / error      ▼ poll failure
//!   └──reset──── FailedInitiation          FailedConfirmation ──reset──▶ Idle
//! ```

use crate::config::PayeeConfig;
use desk_core::{Currency, DeskError, DeskResult, Money, PaymentMethod, PhoneNumber};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The two mutually exclusive ways through step 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentBranch {
    Cash,
    Mobile,
}

impl From<PaymentMethod> for PaymentBranch {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => PaymentBranch::Cash,
            PaymentMethod::Mobile => PaymentBranch::Mobile,
        }
    }
}

/// Mobile-money attempt state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MobilePaymentState {
    #[default]
    Idle,
    Initiating,
    Pending {
        transaction_id: String,
        polls: u32,
        last_error: Option<String>,
    },
    Success {
        transaction_id: String,
    },
    FailedInitiation {
        message: String,
    },
    FailedConfirmation {
        message: String,
    },
}

impl MobilePaymentState {
    /// A charge may be live on the payer's handset
    pub fn in_progress(&self) -> bool {
        matches!(
            self,
            MobilePaymentState::Initiating | MobilePaymentState::Pending { .. }
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            MobilePaymentState::FailedInitiation { .. }
                | MobilePaymentState::FailedConfirmation { .. }
        )
    }
}

/// What the payment screen shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum PaymentView {
    /// Payment method not known yet; nothing to do until it is
    AwaitingMethod,
    Cash {
        amount_due: Option<Money>,
    },
    Mobile {
        amount: Option<Money>,
        state: MobilePaymentState,
    },
}

/// Supported payee numbers for the mobile-money gateway
#[derive(Debug, Clone)]
pub struct PayeeRule {
    country_code: String,
    national: Regex,
}

impl PayeeRule {
    pub fn new(config: &PayeeConfig) -> DeskResult<Self> {
        let national = Regex::new(&config.national_pattern).map_err(|e| {
            DeskError::Configuration(format!("Invalid payee pattern: {}", e))
        })?;
        Ok(Self {
            country_code: config.country_code.trim_start_matches('+').to_string(),
            national,
        })
    }

    /// Accept a national number (`670000000`) or a full one (`+237 670 000 000`)
    pub fn validate(&self, raw: &str) -> DeskResult<PhoneNumber> {
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let phone = if self.national.is_match(&compact) {
            PhoneNumber::parse(&format!("+{}{}", self.country_code, compact))?
        } else {
            PhoneNumber::parse(&compact)?
        };

        if phone.country_code() != self.country_code || !self.national.is_match(phone.national()) {
            return Err(DeskError::validation(
                "payee",
                format!(
                    "mobile money is only available for +{} numbers",
                    self.country_code
                ),
            ));
        }
        Ok(phone)
    }
}

/// Cash collection form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashForm {
    pub amount: String,
    pub confirmation: String,
    /// "I confirm the amount was physically received"
    #[serde(default)]
    pub received: bool,
}

impl CashForm {
    /// Submission is enabled only for matching positive amounts and a ticked checkbox
    pub fn can_submit(&self, currency: Currency) -> bool {
        self.validate(currency).is_ok()
    }

    /// The received amount, or why submission is blocked
    pub fn validate(&self, currency: Currency) -> DeskResult<Money> {
        let amount = Money::parse(&self.amount, currency)?;
        let confirmation = Money::parse(&self.confirmation, currency)
            .map_err(|_| DeskError::validation("confirmation", "re-enter the amount"))?;

        if !amount.is_positive() {
            return Err(DeskError::validation("amount", "must be greater than zero"));
        }
        if amount != confirmation {
            return Err(DeskError::validation("confirmation", "amounts do not match"));
        }
        if !self.received {
            return Err(DeskError::validation(
                "received",
                "confirm the cash was physically received",
            ));
        }
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> PayeeRule {
        PayeeRule::new(&PayeeConfig::default()).unwrap()
    }

    fn cash(amount: &str, confirmation: &str, received: bool) -> CashForm {
        CashForm {
            amount: amount.to_string(),
            confirmation: confirmation.to_string(),
            received,
        }
    }

    #[test]
    fn test_payee_national_and_international() {
        let rule = rule();
        assert_eq!(rule.validate("670000000").unwrap().e164(), "+237670000000");
        assert_eq!(rule.validate("+237 699 12 34 56").unwrap().e164(), "+237699123456");
    }

    #[test]
    fn test_payee_rejections() {
        let rule = rule();
        // Landline prefix
        assert!(rule.validate("233000000").is_err());
        // Other country
        assert!(rule.validate("+233 24 123 4567").is_err());
        assert!(rule.validate("not a number").is_err());
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let config = PayeeConfig {
            country_code: "237".to_string(),
            national_pattern: "([".to_string(),
        };
        assert!(matches!(
            PayeeRule::new(&config),
            Err(DeskError::Configuration(_))
        ));
    }

    #[test]
    fn test_cash_form_gate() {
        let xaf = Currency::XAF;
        assert!(cash("45000", "45000", true).can_submit(xaf));
        assert!(cash("45 000", "45000", true).can_submit(xaf));

        // Amounts differ
        assert!(!cash("45000", "4500", true).can_submit(xaf));
        // Checkbox unchecked even though amounts match
        assert!(!cash("45000", "45000", false).can_submit(xaf));
        // Zero, negative, unparsable
        assert!(!cash("0", "0", true).can_submit(xaf));
        assert!(!cash("-5", "-5", true).can_submit(xaf));
        assert!(!cash("abc", "abc", true).can_submit(xaf));
        assert!(!cash("", "", true).can_submit(xaf));
    }

    #[test]
    fn test_mobile_state_flags() {
        assert!(MobilePaymentState::Initiating.in_progress());
        assert!(!MobilePaymentState::Idle.in_progress());
        assert!(MobilePaymentState::FailedConfirmation {
            message: "timeout".to_string()
        }
        .is_failed());
        assert_eq!(MobilePaymentState::default(), MobilePaymentState::Idle);
    }
}
