//! # Workflow State
//!
//! The one record tracking a booking in progress across all five steps.
//! Fields are private; only the controller in this crate writes them,
//! through setters that keep the per-field rules.

use desk_core::{
    Booking, BookingDetails, Conversion, DateRange, DeskError, DeskResult, GuestPayload,
    PaymentMethod, RoomSummary, Step,
};
use serde::Serialize;

/// Session-scoped booking-in-progress
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingWorkflowState {
    step: Step,
    date_range: Option<DateRange>,
    selected_room: Option<RoomSummary>,
    guest_payload: Option<GuestPayload>,
    created_booking: Option<Booking>,
    booking_details: Option<BookingDetails>,
    conversion: Option<Conversion>,
    /// Cash recorded at the desk or mobile payment confirmed by polling
    payment_confirmed: bool,
    /// Room or dates changed after the booking was written
    #[serde(skip)]
    booking_outdated: bool,
}

impl BookingWorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn selected_room(&self) -> Option<&RoomSummary> {
        self.selected_room.as_ref()
    }

    pub fn guest_payload(&self) -> Option<&GuestPayload> {
        self.guest_payload.as_ref()
    }

    pub fn created_booking(&self) -> Option<&Booking> {
        self.created_booking.as_ref()
    }

    pub fn booking_details(&self) -> Option<&BookingDetails> {
        self.booking_details.as_ref()
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        self.conversion.as_ref()
    }

    /// Latest known booking record: refreshed details win over the creation response
    pub fn booking(&self) -> Option<&Booking> {
        self.booking_details
            .as_ref()
            .map(|d| &d.booking)
            .or(self.created_booking.as_ref())
    }

    pub fn booking_id(&self) -> Option<u64> {
        self.created_booking.as_ref().map(|b| b.id)
    }

    /// Method chosen at step 2, else the one recorded on the booking
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.guest_payload
            .as_ref()
            .map(|g| g.payment_method)
            .or_else(|| self.created_booking.as_ref()?.payment_method)
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.booking_details.as_ref()?.payment_reference.as_deref()
    }

    /// The booking shows both the Paid and the Confirmed flag
    pub fn payment_recorded(&self) -> bool {
        self.booking().is_some_and(Booking::is_paid_and_confirmed)
    }

    /// Step 4 is settled: confirmed by this session or visible on the booking
    pub fn payment_settled(&self) -> bool {
        self.payment_confirmed || self.payment_recorded()
    }

    /// The booking on record matches the current room and dates
    pub fn booking_current(&self) -> bool {
        self.created_booking.is_some() && !self.booking_outdated
    }

    /// Whether picking `room_id` for `range` would change the held selection
    pub fn selection_differs(&self, room_id: u64, range: &DateRange) -> bool {
        self.selected_room.as_ref().map(|r| r.id) != Some(room_id)
            || self.date_range.as_ref() != Some(range)
    }

    /// Whether the forward guard out of `step` holds
    pub fn guard_holds(&self, step: Step) -> Result<(), String> {
        match step {
            Step::SelectRoom => match (&self.selected_room, &self.date_range) {
                (Some(_), Some(_)) => Ok(()),
                _ => Err("select a room for a valid date range first".to_string()),
            },
            Step::GuestDetails if self.created_booking.is_none() => {
                Err("the booking has not been created yet".to_string())
            }
            Step::GuestDetails if self.booking_outdated => {
                Err("room or dates changed; resubmit the guest details".to_string())
            }
            Step::GuestDetails => Ok(()),
            Step::ConfirmBooking if self.conversion.is_some() => Ok(()),
            Step::ConfirmBooking => Err("the payable amount is not finalized yet".to_string()),
            Step::Payment if self.payment_settled() => Ok(()),
            Step::Payment => Err("payment has not been recorded".to_string()),
            Step::CheckIn => Err("check-in is the last step".to_string()),
        }
    }

    /// Earliest step whose data the current step depends on but which is missing
    pub fn earliest_unmet_step(&self) -> Option<Step> {
        let needs = |upto: Step| self.step > upto;

        if needs(Step::SelectRoom) && (self.selected_room.is_none() || self.date_range.is_none()) {
            return Some(Step::SelectRoom);
        }
        if needs(Step::GuestDetails)
            && (self.guest_payload.is_none() || self.created_booking.is_none())
        {
            return Some(Step::GuestDetails);
        }
        if needs(Step::ConfirmBooking) && self.conversion.is_none() {
            return Some(Step::ConfirmBooking);
        }
        None
    }

    // ===== Setters (crate-private) =====

    pub(crate) fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    pub(crate) fn select(&mut self, room: RoomSummary, range: DateRange) {
        if self.selection_differs(room.id, &range) && self.created_booking.is_some() {
            self.booking_outdated = true;
        }
        self.selected_room = Some(room);
        self.date_range = Some(range);
    }

    pub(crate) fn set_guest(&mut self, guest: GuestPayload) {
        self.guest_payload = Some(guest);
    }

    /// Record the created booking; its identity never changes within a session
    pub(crate) fn record_booking(&mut self, booking: Booking) -> DeskResult<()> {
        if let Some(existing) = &self.created_booking {
            if existing.id != booking.id {
                return Err(DeskError::Internal(format!(
                    "booking {} already recorded, refusing {}",
                    existing.id, booking.id
                )));
            }
        }
        self.created_booking = Some(booking);
        self.booking_outdated = false;
        Ok(())
    }

    /// Replace the refreshed record (last write wins)
    pub(crate) fn set_details(&mut self, details: BookingDetails) {
        self.booking_details = Some(details);
    }

    /// Booking was rewritten in place after a resubmit at step 2
    pub(crate) fn booking_rewritten(&mut self, details: BookingDetails) {
        self.booking_outdated = false;
        // A payment taken for the old booking does not settle the new one
        self.payment_confirmed = false;
        // Price may have changed, so the old conversion no longer applies
        self.conversion = None;
        self.booking_details = Some(details);
    }

    /// Keep an authoritative conversion; a later fetch never clears it
    pub(crate) fn set_conversion(&mut self, conversion: Conversion) {
        if conversion.conversion_type.is_authoritative() {
            self.conversion = Some(conversion);
        }
    }

    pub(crate) fn mark_payment_confirmed(&mut self) {
        self.payment_confirmed = true;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
