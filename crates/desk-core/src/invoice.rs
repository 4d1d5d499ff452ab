//! # Invoice
//!
//! Print-formatted invoice derived from data the workflow already holds.
//! Building or rendering one never touches the network.

use crate::booking::{BookingDetails, ChargeLine, GuestPayload, PaymentMethod};
use crate::conversion::Conversion;
use crate::error::{DeskError, DeskResult};
use crate::hotel::Hotel;
use crate::money::Money;
use crate::room::{DateRange, RoomSummary};
use crate::step::Step;
use chrono::NaiveDate;
use serde::Serialize;

const WIDTH: usize = 48;

/// Everything the invoice may draw from; later fields fill gaps in `details`
#[derive(Debug, Clone, Copy)]
pub struct InvoiceSource<'a> {
    pub hotel: &'a Hotel,
    pub details: &'a BookingDetails,
    pub guest: Option<&'a GuestPayload>,
    pub room: Option<&'a RoomSummary>,
    pub stay: Option<&'a DateRange>,
    pub conversion: Option<&'a Conversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub hotel_name: String,
    pub hotel_address: String,
    pub hotel_contact: String,
    pub booking_code: String,
    pub booking_status: String,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub room: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: Option<i64>,
    pub lines: Vec<ChargeLine>,
    pub tax: Option<Money>,
    pub total: Money,
    pub amount_paid: Option<Money>,
    pub reference_amount: Option<Money>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
}

impl Invoice {
    /// Assemble an invoice.
    ///
    /// The total comes from the server breakdown when present, else from the
    /// booking's required amount, else from nightly rate times nights.
    pub fn build(source: InvoiceSource<'_>) -> DeskResult<Self> {
        let details = source.details;
        let booking = &details.booking;
        let guest = details.guest.as_ref().or(source.guest);
        let room = details.room.as_ref().or(source.room);
        let stay = details.stay.as_ref().or(source.stay);
        let nights = details.duration_nights.or_else(|| stay.map(DateRange::nights));

        let breakdown = details.calculation_breakdown.as_ref();
        let total = match (
            breakdown.map(|b| b.final_amount).or(booking.billing.amount_required),
            room.zip(nights),
        ) {
            (Some(total), _) => total,
            (None, Some((room, nights))) => room.nightly_rate.times(nights)?,
            (None, None) => {
                return Err(DeskError::StateLost {
                    restart_at: Step::ConfirmBooking,
                    reason: format!("no payable amount known for booking {}", booking.code),
                })
            }
        };

        Ok(Self {
            hotel_name: source.hotel.name.clone(),
            hotel_address: source.hotel.address.clone(),
            hotel_contact: source.hotel.contact_line(),
            booking_code: booking.code.clone(),
            booking_status: booking.status.label().to_string(),
            guest_name: guest.map(GuestPayload::full_name),
            guest_phone: guest.map(|g| g.phone.e164()),
            room: room.map(|r| format!("{} ({})", r.code, r.room_type)),
            check_in: stay.map(DateRange::start),
            check_out: stay.map(DateRange::end),
            nights,
            lines: breakdown.map(|b| b.display_lines()).unwrap_or_default(),
            tax: breakdown.and_then(|b| b.tax).filter(|t| t.amount != 0),
            total,
            amount_paid: booking.billing.amount_paid,
            reference_amount: source.conversion.map(Conversion::payable),
            payment_method: booking.payment_method.or(guest.map(|g| g.payment_method)),
            payment_reference: details.payment_reference.clone(),
        })
    }

    /// Plain-text rendering for the receipt printer
    pub fn render_text(&self) -> String {
        let rule = "-".repeat(WIDTH);
        let mut out = Vec::new();

        out.push(center(&self.hotel_name));
        if !self.hotel_address.is_empty() {
            out.push(center(&self.hotel_address));
        }
        if !self.hotel_contact.is_empty() {
            out.push(center(&self.hotel_contact));
        }
        out.push(rule.clone());
        out.push(row("Booking", &self.booking_code));
        out.push(row("Status", &self.booking_status));
        if let Some(name) = &self.guest_name {
            out.push(row("Guest", name));
        }
        if let Some(phone) = &self.guest_phone {
            out.push(row("Phone", phone));
        }
        if let Some(room) = &self.room {
            out.push(row("Room", room));
        }
        if let (Some(start), Some(end)) = (self.check_in, self.check_out) {
            out.push(row("Stay", &format!("{} -> {}", start, end)));
        }
        if let Some(nights) = self.nights {
            out.push(row("Nights", &nights.to_string()));
        }
        out.push(rule.clone());
        for line in &self.lines {
            out.push(row(&line.description, &line.amount.display()));
        }
        if let Some(tax) = self.tax {
            out.push(row("Tax", &tax.display()));
        }
        out.push(row("TOTAL", &self.total.display()));
        if let Some(reference) = self.reference_amount {
            out.push(row("Payable (reference)", &reference.display()));
        }
        if let Some(paid) = self.amount_paid {
            out.push(row("Paid", &paid.display()));
        }
        if let Some(method) = self.payment_method {
            out.push(row("Method", method.as_str()));
        }
        if let Some(reference) = &self.payment_reference {
            out.push(row("Reference", reference));
        }
        out.push(rule);

        out.join("\n")
    }
}

fn center(text: &str) -> String {
    format!("{:^width$}", text, width = WIDTH).trim_end().to_string()
}

fn row(label: &str, value: &str) -> String {
    let gap = WIDTH.saturating_sub(label.chars().count() + value.chars().count()).max(1);
    format!("{}{}{}", label, " ".repeat(gap), value)
}
