//! # Workflow Steps
//!
//! The five stages of the booking desk workflow.

use serde::{Deserialize, Serialize};

/// A stage of the booking workflow, numbered 1..=5
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    SelectRoom,
    GuestDetails,
    ConfirmBooking,
    Payment,
    CheckIn,
}

impl Step {
    /// All steps in order
    pub const ALL: [Step; 5] = [
        Step::SelectRoom,
        Step::GuestDetails,
        Step::ConfirmBooking,
        Step::Payment,
        Step::CheckIn,
    ];

    /// 1-based step number
    pub fn number(self) -> u8 {
        match self {
            Step::SelectRoom => 1,
            Step::GuestDetails => 2,
            Step::ConfirmBooking => 3,
            Step::Payment => 4,
            Step::CheckIn => 5,
        }
    }

    /// Step for a 1-based number
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// The following step, `None` at the terminal step
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, `None` at the first step
    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::SelectRoom => "select room",
            Step::GuestDetails => "guest details",
            Step::ConfirmBooking => "confirm booking",
            Step::Payment => "payment",
            Step::CheckIn => "check-in",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}
