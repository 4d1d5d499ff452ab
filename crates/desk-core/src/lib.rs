//! # desk-core
//!
//! Core types and traits for the hotel-desk booking workflow.
//!
//! This crate provides:
//! - `Money` and `Currency` for prices and payments
//! - `DateRange`, `RoomSummary` and availability reports for room search
//! - `GuestPayload`, `Booking`, `BookingDetails` and `CalculationBreakdown`
//! - `Conversion` and the authoritative-conversion rule
//! - `InventoryService`, `BookingService`, `ConversionService` and
//!   `PaymentGateway` collaborator traits
//! - `Invoice` for the check-in receipt
//! - `DeskError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use desk_core::{DateRange, fully_available_rooms};
//!
//! let range = DateRange::for_booking(start, end, clock.today())?;
//! let report = inventory.room_availability(hotel.id, &range, None).await?;
//!
//! // Only rooms free on every night are offered
//! let offered = fully_available_rooms(&report, &range);
//! ```

pub mod booking;
pub mod conversion;
pub mod error;
pub mod gateway;
pub mod hotel;
pub mod invoice;
pub mod money;
pub mod phone;
pub mod room;
pub mod step;

// Re-exports for convenience
pub use booking::{
    Billing, Booking, BookingDetails, BookingPatch, BookingStatus, BookingType,
    CalculationBreakdown, ChargeEntry, ChargeLine, GuestPayload, NewBooking, Occupancy,
    PaymentMethod, PaymentStatus,
};
pub use conversion::{authoritative_conversion, Conversion, ConversionSnapshot, ConversionType};
pub use error::{DeskError, DeskResult, ErrorKind};
pub use gateway::{
    BookingService, Clock, Collaborators, ConversionService, FixedClock, InventoryService,
    PaymentGateway, PaymentInitiation, PaymentInitiationResult, SystemClock,
};
pub use hotel::Hotel;
pub use invoice::{Invoice, InvoiceSource};
pub use money::{Currency, Money};
pub use phone::PhoneNumber;
pub use room::{
    fully_available_rooms, nights_between, AvailabilityStatus, DateRange, DayAvailability,
    RoomAvailability, RoomSummary, RoomType,
};
pub use step::Step;
