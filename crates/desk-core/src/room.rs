//! # Room Types
//!
//! Date ranges, room summaries and the day-by-day availability returned
//! by the inventory service.

use crate::error::{DeskError, DeskResult};
use crate::money::Money;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of nights billed between two dates.
///
/// Never zero: a same-day stay is billed as one night.
pub fn nights_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(1)
}

/// A stay period, `start` inclusive and `end` exclusive (check-out day)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; the end date must be strictly after the start date
    pub fn new(start: NaiveDate, end: NaiveDate) -> DeskResult<Self> {
        if end <= start {
            return Err(DeskError::validation(
                "date_range",
                format!("end date {} must be after start date {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// Create a range for a new booking: also rejects a start in the past
    pub fn for_booking(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> DeskResult<Self> {
        if start < today {
            return Err(DeskError::validation(
                "date_range",
                format!("start date {} is in the past", start),
            ));
        }
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn nights(&self) -> i64 {
        nights_between(self.start, self.end)
    }

    /// Every night of the stay, check-out day excluded
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.nights()).map(move |offset| self.start + Duration::days(offset))
    }
}

/// A room type from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: u64,
    pub name: String,
}

/// The part of a room the workflow carries around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: u64,
    pub code: String,
    pub room_type: String,
    pub nightly_rate: Money,
}

/// Availability of one room on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Booked,
    Maintenance,
    /// Any status the desk does not know about
    Other(String),
}

impl AvailabilityStatus {
    /// Parse the backend's status label
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "available" => AvailabilityStatus::Available,
            "booked" | "occupied" | "reserved" => AvailabilityStatus::Booked,
            "maintenance" | "out of service" => AvailabilityStatus::Maintenance,
            _ => AvailabilityStatus::Other(label.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub status: AvailabilityStatus,
}

/// A room with its day-by-day availability over a queried range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room: RoomSummary,
    pub days: Vec<DayAvailability>,
}

impl RoomAvailability {
    /// True only if the room is `Available` on every night of `range`.
    /// A night missing from the report counts as unavailable.
    pub fn is_available_for(&self, range: &DateRange) -> bool {
        range.days().all(|night| {
            self.days
                .iter()
                .any(|d| d.date == night && d.status == AvailabilityStatus::Available)
        }) && self
            .days
            .iter()
            .filter(|d| d.date >= range.start() && d.date < range.end())
            .all(|d| d.status == AvailabilityStatus::Available)
    }
}

/// Rooms that can be offered for the whole range; partial availability is excluded
pub fn fully_available_rooms(rooms: &[RoomAvailability], range: &DateRange) -> Vec<RoomSummary> {
    rooms
        .iter()
        .filter(|r| r.is_available_for(range))
        .map(|r| r.room.clone())
        .collect()
}
