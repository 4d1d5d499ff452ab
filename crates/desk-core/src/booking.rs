//! # Booking Types
//!
//! Guest submissions, booking records and the server-computed charge
//! breakdown for the booking desk.

use crate::money::{Currency, Money};
use crate::phone::PhoneNumber;
use crate::room::{DateRange, RoomSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the guest settles the bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Mobile,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Mobile => "Mobile",
        }
    }

    /// Parse the backend label; unknown labels are `None`, never a third branch
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "mobile" | "mobile money" | "momo" => Some(PaymentMethod::Mobile),
            _ => None,
        }
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Processing,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().replace(|c| c == '-' || c == '_', " ").as_str() {
            "processing" | "pending" => BookingStatus::Processing,
            "confirmed" => BookingStatus::Confirmed,
            "checked in" | "checkedin" => BookingStatus::CheckedIn,
            "checked out" | "checkedout" => BookingStatus::CheckedOut,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(label.to_string()),
        }
    }

    /// Label the backend expects on writes
    pub fn label(&self) -> &str {
        match self {
            BookingStatus::Processing => "Processing",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::CheckedIn => "Checked In",
            BookingStatus::CheckedOut => "Checked Out",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Other(s) => s,
        }
    }
}

/// Payment status of a booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Other(String),
}

impl PaymentStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" | "unpaid" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Other(s) => s,
        }
    }
}

/// Walk-in desk bookings are `Physical`; `Online` ones come from the website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingType {
    Physical,
    Online,
}

/// Party size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl Default for Occupancy {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

/// Normalized guest-and-stay submission from the guest details step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: PhoneNumber,
    pub address: String,
    pub occupancy: Occupancy,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GuestPayload {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Booking creation request
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub hotel_id: u64,
    pub room_id: u64,
    pub stay: DateRange,
    pub guest: GuestPayload,
    pub amount_required: Money,
    pub booking_type: BookingType,
    pub booking_status: BookingStatus,
    /// Fresh per user submit so the backend can drop duplicates
    pub idempotency_key: String,
}

/// Billing metadata attached to a booking
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Billing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_required: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

/// A server-assigned booking record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: u64,
    pub code: String,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub billing: Billing,
}

impl Booking {
    pub fn is_checked_in(&self) -> bool {
        self.status == BookingStatus::CheckedIn
    }

    /// Both flags must agree before a mobile payment counts as settled
    pub fn is_paid_and_confirmed(&self) -> bool {
        self.billing.payment_status == PaymentStatus::Paid
            && self.status == BookingStatus::Confirmed
    }
}

/// Refreshed booking record with stay, pricing and payment reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stay: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_nights: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<GuestPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_breakdown: Option<CalculationBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

impl BookingDetails {
    /// Details carrying only what a plain booking record knows
    pub fn from_booking(booking: Booking) -> Self {
        Self {
            booking,
            room: None,
            stay: None,
            duration_nights: None,
            guest: None,
            calculation_breakdown: None,
            payment_reference: None,
        }
    }
}

/// Partial update of a booking
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_required: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stay: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<GuestPayload>,
}

impl BookingPatch {
    /// Patch recording a cash settlement received at the desk
    pub fn cash_settlement(amount_paid: Money) -> Self {
        Self {
            booking_status: Some(BookingStatus::Confirmed),
            payment_status: Some(PaymentStatus::Paid),
            amount_paid: Some(amount_paid),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One server-computed charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeEntry {
    /// `None` means "not applicable", not zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub description: String,
}

/// A charge ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeLine {
    pub kind: String,
    pub description: String,
    pub amount: Money,
}

/// Server-side price calculation for a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBreakdown {
    /// Charge kind (room, breakfast, service...) to entry
    #[serde(default)]
    pub charges: BTreeMap<String, ChargeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
    pub final_amount: Money,
}

impl CalculationBreakdown {
    pub fn currency(&self) -> Currency {
        self.final_amount.currency
    }

    /// Entries worth showing: absent and zero amounts are left out
    pub fn display_lines(&self) -> Vec<ChargeLine> {
        self.charges
            .iter()
            .filter_map(|(kind, entry)| {
                let amount = entry.amount.filter(|m| m.amount != 0)?;
                Some(ChargeLine {
                    kind: kind.clone(),
                    description: if entry.description.is_empty() {
                        kind.clone()
                    } else {
                        entry.description.clone()
                    },
                    amount,
                })
            })
            .collect()
    }

    /// Sum of present entries in the breakdown currency, absent counted as zero
    pub fn subtotal(&self) -> Money {
        let currency = self.currency();
        let total = self
            .charges
            .values()
            .filter_map(|e| e.amount)
            .filter(|m| m.currency == currency)
            .map(|m| m.amount)
            .sum();
        Money::from_minor(total, currency)
    }

    /// Whether `subtotal + tax` matches `final_amount` within one minor unit
    pub fn is_consistent(&self) -> bool {
        let currency = self.currency();
        let mixed = self
            .charges
            .values()
            .filter_map(|e| e.amount)
            .any(|m| m.currency != currency);
        let tax = self.tax.map(|t| t.amount).unwrap_or(0);
        !mixed && (self.subtotal().amount + tax - self.final_amount.amount).abs() <= 1
    }
}
