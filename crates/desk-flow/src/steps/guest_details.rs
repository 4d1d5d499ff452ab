//! Step 2: guest details and booking creation.

use desk_core::{
    BookingPatch, BookingStatus, BookingType, DateRange, DeskError, DeskResult, GuestPayload,
    Money, NewBooking, Occupancy, PaymentMethod, PhoneNumber, RoomSummary,
};
use serde::{Deserialize, Serialize};

/// Raw guest form as typed at the desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub notes: String,
}

fn one() -> u32 {
    1
}

impl Default for GuestForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            adults: 1,
            children: 0,
            infants: 0,
            payment_method: None,
            notes: String::new(),
        }
    }
}

impl From<&GuestPayload> for GuestForm {
    fn from(payload: &GuestPayload) -> Self {
        Self {
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone().unwrap_or_default(),
            phone: payload.phone.e164(),
            address: payload.address.clone(),
            adults: payload.occupancy.adults,
            children: payload.occupancy.children,
            infants: payload.occupancy.infants,
            payment_method: Some(payload.payment_method),
            notes: payload.notes.clone().unwrap_or_default(),
        }
    }
}

impl GuestForm {
    /// Validate and normalize into a payload
    pub fn validate(&self) -> DeskResult<GuestPayload> {
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;

        let email = optional(&self.email);
        if let Some(email) = &email {
            if !looks_like_email(email) {
                return Err(DeskError::validation(
                    "email",
                    format!("'{}' is not an email address", email),
                ));
            }
        }

        let phone = PhoneNumber::parse(&self.phone)?;

        if self.adults < 1 {
            return Err(DeskError::validation("adults", "at least one adult is required"));
        }

        let payment_method = self
            .payment_method
            .ok_or_else(|| DeskError::validation("payment_method", "choose Cash or Mobile"))?;

        Ok(GuestPayload {
            first_name,
            last_name,
            email,
            phone,
            address: self.address.trim().to_string(),
            occupancy: Occupancy {
                adults: self.adults,
                children: self.children,
                infants: self.infants,
            },
            payment_method,
            notes: optional(&self.notes),
        })
    }
}

fn required(field: &str, value: &str) -> DeskResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeskError::validation(field, "is required"));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Amount required for the stay: nightly rate times nights, never zero nights
pub fn required_amount(room: &RoomSummary, range: &DateRange) -> DeskResult<Money> {
    room.nightly_rate.times(range.nights())
}

/// Creation request for a walk-in booking, with a fresh idempotency key
pub fn new_booking(
    hotel_id: u64,
    room: &RoomSummary,
    range: DateRange,
    guest: GuestPayload,
) -> DeskResult<NewBooking> {
    Ok(NewBooking {
        hotel_id,
        room_id: room.id,
        stay: range,
        amount_required: required_amount(room, &range)?,
        guest,
        booking_type: BookingType::Physical,
        booking_status: BookingStatus::Processing,
        idempotency_key: uuid::Uuid::new_v4().to_string(),
    })
}

/// Patch rewriting an existing booking after the guest resubmits step 2
pub fn rewrite_patch(
    room: &RoomSummary,
    range: DateRange,
    guest: GuestPayload,
) -> DeskResult<BookingPatch> {
    Ok(BookingPatch {
        amount_required: Some(required_amount(room, &range)?),
        room_id: Some(room.id),
        stay: Some(range),
        guest: Some(guest),
        ..BookingPatch::default()
    })
}
