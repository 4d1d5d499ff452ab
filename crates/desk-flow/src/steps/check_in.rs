//! Step 5: invoice, check-in and finish.

use crate::state::BookingWorkflowState;
use desk_core::{
    BookingDetails, DeskError, DeskResult, Hotel, Invoice, InvoiceSource, Step,
};

/// Build the invoice from what the workflow already holds
pub fn invoice(hotel: &Hotel, state: &BookingWorkflowState) -> DeskResult<Invoice> {
    let created = state.created_booking().ok_or_else(|| DeskError::StateLost {
        restart_at: Step::GuestDetails,
        reason: "no booking to invoice".to_string(),
    })?;

    let fallback;
    let details = match state.booking_details() {
        Some(details) => details,
        None => {
            fallback = BookingDetails::from_booking(created.clone());
            &fallback
        }
    };

    Invoice::build(InvoiceSource {
        hotel,
        details,
        guest: state.guest_payload(),
        room: state.selected_room(),
        stay: state.date_range(),
        conversion: state.conversion(),
    })
}

/// Check-in is offered until the booking shows as checked in
pub fn check_in_allowed(state: &BookingWorkflowState) -> DeskResult<u64> {
    let booking = state.booking().ok_or_else(|| DeskError::StateLost {
        restart_at: Step::GuestDetails,
        reason: "no booking to check in".to_string(),
    })?;
    if booking.is_checked_in() {
        return Err(DeskError::guard(
            Step::CheckIn,
            format!("booking {} is already checked in", booking.code),
        ));
    }
    Ok(booking.id)
}
