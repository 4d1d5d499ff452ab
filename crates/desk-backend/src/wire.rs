//! Backend JSON shapes and their mapping onto `desk-core` types.
//!
//! The backend serializes decimals either as JSON numbers or as strings
//! (`"15000.00"`), so every amount goes through [`WireAmount`].

use chrono::NaiveDate;
use desk_core::{
    AvailabilityStatus, Billing, Booking, BookingDetails, BookingPatch, BookingStatus,
    CalculationBreakdown, ChargeEntry, Conversion, ConversionSnapshot, ConversionType, Currency,
    DateRange, DayAvailability, DeskError, DeskResult, GuestPayload, Money, NewBooking,
    Occupancy, PaymentMethod, PaymentStatus, PhoneNumber, RoomAvailability, RoomSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireAmount {
    Number(f64),
    Text(String),
}

impl WireAmount {
    fn to_f64(&self) -> DeskResult<f64> {
        match self {
            WireAmount::Number(n) => Ok(*n),
            WireAmount::Text(s) => s.trim().parse().map_err(|_| {
                DeskError::Serialization(format!("'{}' is not a decimal amount", s))
            }),
        }
    }

    fn to_money(&self, currency: Currency) -> DeskResult<Money> {
        Ok(Money::new(self.to_f64()?, currency))
    }
}

pub(crate) fn currency(code: &str) -> DeskResult<Currency> {
    Currency::from_code(code)
        .ok_or_else(|| DeskError::Serialization(format!("unsupported currency '{}'", code)))
}

/// Decimal string in the currency's precision, the form the backend accepts on writes
pub(crate) fn decimal(money: &Money) -> String {
    let places = money.currency.decimal_places() as usize;
    format!("{:.*}", places, money.as_decimal())
}

// =============================================================================
// Availability
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireRoomType {
    #[allow(dead_code)]
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRoom {
    pub id: u64,
    pub code: String,
    pub room_type: WireRoomType,
    pub price_per_night: WireAmount,
    pub currency: String,
}

impl WireRoom {
    pub fn into_summary(self) -> DeskResult<RoomSummary> {
        let currency = currency(&self.currency)?;
        Ok(RoomSummary {
            id: self.id,
            code: self.code,
            room_type: self.room_type.name,
            nightly_rate: self.price_per_night.to_money(currency)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDay {
    pub date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRoomAvailability {
    pub room: WireRoom,
    #[serde(default)]
    pub availability: Vec<WireDay>,
}

impl WireRoomAvailability {
    pub fn into_core(self) -> DeskResult<RoomAvailability> {
        Ok(RoomAvailability {
            room: self.room.into_summary()?,
            days: self
                .availability
                .into_iter()
                .map(|d| DayAvailability {
                    date: d.date,
                    status: AvailabilityStatus::from_label(&d.status),
                })
                .collect(),
        })
    }
}

// =============================================================================
// Bookings
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct WireGuestFields {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&GuestPayload> for WireGuestFields {
    fn from(guest: &GuestPayload) -> Self {
        Self {
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            email: guest.email.clone(),
            phone: guest.phone.e164(),
            address: guest.address.clone(),
            adults: guest.occupancy.adults,
            children: guest.occupancy.children,
            infants: guest.occupancy.infants,
            payment_method: guest.payment_method.as_str(),
            notes: guest.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WireNewBooking {
    pub hotel: u64,
    pub room: u64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(flatten)]
    pub guest: WireGuestFields,
    pub booking_type: &'static str,
    pub booking_status: String,
    pub amount_required: String,
    pub currency: &'static str,
}

impl From<&NewBooking> for WireNewBooking {
    fn from(b: &NewBooking) -> Self {
        Self {
            hotel: b.hotel_id,
            room: b.room_id,
            check_in_date: b.stay.start(),
            check_out_date: b.stay.end(),
            guest: WireGuestFields::from(&b.guest),
            booking_type: match b.booking_type {
                desk_core::BookingType::Physical => "Physical",
                desk_core::BookingType::Online => "Online",
            },
            booking_status: b.booking_status.label().to_string(),
            amount_required: decimal(&b.amount_required),
            currency: b.amount_required.currency.as_str(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct WireBookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid_currency: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub guest: Option<WireGuestFields>,
}

impl From<&BookingPatch> for WireBookingPatch {
    fn from(p: &BookingPatch) -> Self {
        Self {
            booking_status: p.booking_status.as_ref().map(|s| s.label().to_string()),
            payment_status: p.payment_status.as_ref().map(|s| s.label().to_string()),
            amount_paid: p.amount_paid.as_ref().map(decimal),
            amount_paid_currency: p.amount_paid.map(|m| m.currency.as_str()),
            amount_required: p.amount_required.as_ref().map(decimal),
            room: p.room_id,
            check_in_date: p.stay.map(|s| s.start()),
            check_out_date: p.stay.map(|s| s.end()),
            guest: p.guest.as_ref().map(WireGuestFields::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChargeEntry {
    #[serde(default)]
    pub amount: Option<WireAmount>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBreakdown {
    #[serde(default)]
    pub charges: BTreeMap<String, Option<WireChargeEntry>>,
    #[serde(default)]
    pub tax: Option<WireAmount>,
    pub final_amount: WireAmount,
    #[serde(default)]
    pub currency: Option<String>,
}

impl WireBreakdown {
    fn into_core(self, fallback: Currency) -> DeskResult<CalculationBreakdown> {
        let currency = match &self.currency {
            Some(code) => currency(code)?,
            None => fallback,
        };
        let mut charges = BTreeMap::new();
        // A null entry means "not applicable" and is dropped here
        for (kind, entry) in self.charges {
            let Some(entry) = entry else { continue };
            let entry_currency = match &entry.currency {
                Some(code) => currency_or(code, currency),
                None => currency,
            };
            let amount = match &entry.amount {
                Some(a) => Some(a.to_money(entry_currency)?),
                None => None,
            };
            charges.insert(
                kind,
                ChargeEntry {
                    amount,
                    description: entry.description,
                },
            );
        }
        Ok(CalculationBreakdown {
            charges,
            tax: self.tax.map(|t| t.to_money(currency)).transpose()?,
            final_amount: self.final_amount.to_money(currency)?,
        })
    }
}

fn currency_or(code: &str, fallback: Currency) -> Currency {
    Currency::from_code(code).unwrap_or(fallback)
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBooking {
    pub id: u64,
    pub code: String,
    pub booking_status: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount_required: Option<WireAmount>,
    #[serde(default)]
    pub amount_paid: Option<WireAmount>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub room: Option<WireRoom>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
    #[serde(default)]
    pub infants: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub calculation_breakdown: Option<WireBreakdown>,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

impl WireBooking {
    pub fn into_booking(self) -> DeskResult<Booking> {
        Ok(self.into_details()?.booking)
    }

    pub fn into_details(self) -> DeskResult<BookingDetails> {
        let currency = match &self.currency {
            Some(code) => currency(code)?,
            None => Currency::default(),
        };
        let payment_method = self
            .payment_method
            .as_deref()
            .and_then(PaymentMethod::from_label);

        let booking = Booking {
            id: self.id,
            code: self.code,
            status: BookingStatus::from_label(&self.booking_status),
            payment_method,
            billing: Billing {
                amount_required: self
                    .amount_required
                    .as_ref()
                    .map(|a| a.to_money(currency))
                    .transpose()?,
                amount_paid: self
                    .amount_paid
                    .as_ref()
                    .map(|a| a.to_money(currency))
                    .transpose()?,
                payment_status: self
                    .payment_status
                    .as_deref()
                    .map(PaymentStatus::from_label)
                    .unwrap_or_default(),
            },
        };

        let stay = match (self.check_in_date, self.check_out_date) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        };

        // Guest block only when the record carries a usable contact
        let guest = match (self.first_name, self.last_name, self.phone, payment_method) {
            (Some(first_name), Some(last_name), Some(phone), Some(method)) => {
                PhoneNumber::parse(&phone).ok().map(|phone| GuestPayload {
                    first_name,
                    last_name,
                    email: self.email,
                    phone,
                    address: self.address.unwrap_or_default(),
                    occupancy: Occupancy {
                        adults: self.adults.unwrap_or(1),
                        children: self.children.unwrap_or(0),
                        infants: self.infants.unwrap_or(0),
                    },
                    payment_method: method,
                    notes: self.notes,
                })
            }
            _ => None,
        };

        Ok(BookingDetails {
            booking,
            room: self.room.map(WireRoom::into_summary).transpose()?,
            stay,
            duration_nights: self.duration,
            guest,
            calculation_breakdown: self
                .calculation_breakdown
                .map(|b| b.into_core(currency))
                .transpose()?,
            payment_reference: self.payment_reference,
        })
    }
}

// =============================================================================
// Conversions
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireConversion {
    pub original_amount: WireAmount,
    pub original_currency: String,
    pub converted_amount: WireAmount,
    pub converted_currency: String,
    pub exchange_rate: WireAmount,
    pub conversion_type: String,
}

impl WireConversion {
    fn into_core(self) -> DeskResult<Conversion> {
        Ok(Conversion {
            original: self
                .original_amount
                .to_money(currency(&self.original_currency)?)?,
            converted: self
                .converted_amount
                .to_money(currency(&self.converted_currency)?)?,
            exchange_rate: self.exchange_rate.to_f64()?,
            conversion_type: ConversionType::from_tag(&self.conversion_type),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireConversionSnapshot {
    pub booking: WireBooking,
    #[serde(default)]
    pub conversions: Vec<WireConversion>,
}

impl WireConversionSnapshot {
    pub fn into_core(self) -> DeskResult<ConversionSnapshot> {
        Ok(ConversionSnapshot {
            booking: self.booking.into_details()?,
            conversions: self
                .conversions
                .into_iter()
                .map(WireConversion::into_core)
                .collect::<DeskResult<_>>()?,
        })
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error bodies seen from the backend and the gateway
#[derive(Debug, Deserialize)]
pub(crate) struct WireErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WireErrorBody {
    pub fn text(self) -> Option<String> {
        self.detail.or(self.message).or(self.error)
    }
}
