//! Step 3: wait for the finalized price and show the breakdown.

use crate::state::BookingWorkflowState;
use desk_core::{ChargeLine, Conversion, ConversionSnapshot, Money};
use serde::Serialize;

/// Progress of the conversion wait
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Not polling (step not active yet)
    #[default]
    Idle,
    /// Polling; `last_error` is set while transport errors are being retried
    Waiting {
        attempts: u32,
        last_error: Option<String>,
    },
    /// Authoritative conversion captured, polling stopped
    Ready,
    /// Polling gave up; `retry_conversion` starts over
    Failed { message: String },
}

/// What the confirmation screen shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationView {
    pub status: ConversionStatus,
    pub lines: Vec<ChargeLine>,
    pub tax: Option<Money>,
    pub total: Option<Money>,
    pub conversion: Option<Conversion>,
    pub can_proceed: bool,
}

impl ConfirmationView {
    pub fn build(state: &BookingWorkflowState, status: &ConversionStatus) -> Self {
        let breakdown = state
            .booking_details()
            .and_then(|d| d.calculation_breakdown.as_ref());
        let total = breakdown
            .map(|b| b.final_amount)
            .or_else(|| state.booking()?.billing.amount_required);

        Self {
            status: status.clone(),
            lines: breakdown.map(|b| b.display_lines()).unwrap_or_default(),
            tax: breakdown.and_then(|b| b.tax).filter(|t| t.amount != 0),
            total,
            conversion: state.conversion().cloned(),
            can_proceed: state.conversion().is_some(),
        }
    }
}

/// Stop condition of the conversion poll; the 3→4 guard relies on the same rule
pub(crate) fn conversion_settled(snapshot: &ConversionSnapshot) -> bool {
    snapshot.authoritative().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_before_any_fetch() {
        let view = ConfirmationView::build(&BookingWorkflowState::new(), &ConversionStatus::default());
        assert_eq!(view.status, ConversionStatus::Idle);
        assert!(!view.can_proceed);
        assert!(view.total.is_none());
        assert!(view.lines.is_empty());
    }
}
