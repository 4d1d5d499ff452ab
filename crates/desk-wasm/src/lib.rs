//! # desk-wasm
//!
//! WebAssembly bindings for hotel-desk-rs.
//!
//! The desk front-end runs the same local checks as the server before a
//! request leaves the browser:
//! - Stay length and date range validation
//! - Guest phone number normalization
//! - Cash form readiness (matching amounts, receipt ticked)
//! - Filtering an availability report down to rooms free every night
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { validate_date_range, cash_form_ready } from 'hotel-desk-wasm';
//!
//! await init();
//!
//! const nights = validate_date_range('2024-06-10', '2024-06-12', today);
//! const enabled = cash_form_ready('40 000', '40000', true, 'XAF');
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use chrono::NaiveDate;
use desk_core::{
    fully_available_rooms, Currency, DateRange, DeskError, DeskResult, Money, PhoneNumber,
    RoomAvailability, RoomSummary,
};
use wasm_bindgen::prelude::*;

fn to_js(err: DeskError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_date(field: &str, value: &str) -> DeskResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        DeskError::validation(field, format!("'{}' is not a YYYY-MM-DD date", value.trim()))
    })
}

fn parse_currency(code: &str) -> DeskResult<Currency> {
    Currency::from_code(code)
        .ok_or_else(|| DeskError::validation("currency", format!("unknown currency '{}'", code)))
}

// ===== Dates =====

fn stay_nights(start: &str, end: &str) -> DeskResult<i64> {
    Ok(desk_core::nights_between(
        parse_date("start_date", start)?,
        parse_date("end_date", end)?,
    ))
}

fn booking_range(start: &str, end: &str, today: &str) -> DeskResult<DateRange> {
    DateRange::for_booking(
        parse_date("start_date", start)?,
        parse_date("end_date", end)?,
        parse_date("today", today)?,
    )
}

/// Nights billed between two ISO dates; a same-day stay counts as one
#[wasm_bindgen]
pub fn nights_between(start: &str, end: &str) -> Result<i64, JsValue> {
    stay_nights(start, end).map_err(to_js)
}

/// Validate a stay for a new booking and return its number of nights
#[wasm_bindgen]
pub fn validate_date_range(start: &str, end: &str, today: &str) -> Result<i64, JsValue> {
    booking_range(start, end, today)
        .map(|range| range.nights())
        .map_err(to_js)
}

// ===== Guest =====

/// Normalize a guest phone number to E.164
#[wasm_bindgen]
pub fn validate_phone(raw: &str) -> Result<String, JsValue> {
    PhoneNumber::parse(raw).map(|p| p.e164()).map_err(to_js)
}

// ===== Payment =====

fn cash_amount(amount: &str, confirmation: &str, received: bool, currency: &str) -> DeskResult<Money> {
    let currency = parse_currency(currency)?;
    let amount = Money::parse(amount, currency)?;
    let confirmation = Money::parse(confirmation, currency)?;

    if !amount.is_positive() {
        return Err(DeskError::validation("amount", "must be greater than zero"));
    }
    if amount != confirmation {
        return Err(DeskError::validation("confirmation", "amounts do not match"));
    }
    if !received {
        return Err(DeskError::validation("received", "tick to confirm receipt"));
    }
    Ok(amount)
}

/// Whether the cash submit button may be enabled
#[wasm_bindgen]
pub fn cash_form_ready(amount: &str, confirmation: &str, received: bool, currency: &str) -> bool {
    cash_amount(amount, confirmation, received, currency).is_ok()
}

/// Display form of an amount given in the currency's smallest unit
#[wasm_bindgen]
pub fn format_amount(minor: i64, currency: &str) -> Result<String, JsValue> {
    parse_currency(currency)
        .map(|c| Money::from_minor(minor, c).display())
        .map_err(to_js)
}

// ===== Rooms =====

fn available_rooms(
    report: &[RoomAvailability],
    start: &str,
    end: &str,
) -> DeskResult<Vec<RoomSummary>> {
    let range = DateRange::new(parse_date("start_date", start)?, parse_date("end_date", end)?)?;
    Ok(fully_available_rooms(report, &range))
}

/// Keep only rooms that are available on every night of the stay
#[wasm_bindgen]
pub fn filter_available_rooms(report: JsValue, start: &str, end: &str) -> Result<JsValue, JsValue> {
    let report: Vec<RoomAvailability> = serde_wasm_bindgen::from_value(report)
        .map_err(|e| JsValue::from_str(&format!("Invalid availability report: {}", e)))?;

    let rooms = available_rooms(&report, start, end).map_err(to_js)?;
    serde_wasm_bindgen::to_value(&rooms).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
