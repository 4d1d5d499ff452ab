//! # Collaborator Traits
//!
//! The booking workflow talks to four external services. Each one is a
//! trait so the REST clients can be swapped for in-memory fakes.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      BookingWorkflow                         │
//! └───────┬───────────────┬────────────────┬───────────────┬─────┘
//!         │               │                │               │
//! ┌───────┴──────┐ ┌──────┴───────┐ ┌──────┴───────┐ ┌─────┴────────┐
//! │  Inventory   │ │   Booking    │ │  Conversion  │ │   Payment    │
//! │   Service    │ │   Service    │ │   Service    │ │   Gateway    │
//! └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! Only `get_booking`, `fetch_conversions` and `room_availability` are safe
//! to poll. `create_booking`, `patch_booking` and `initiate` have side
//! effects and are called at most once per user action.

use crate::booking::{Booking, BookingDetails, BookingPatch, NewBooking};
use crate::conversion::ConversionSnapshot;
use crate::error::DeskResult;
use crate::money::Money;
use crate::phone::PhoneNumber;
use crate::room::{DateRange, RoomAvailability};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Room inventory catalog
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Day-by-day availability of the hotel's rooms over `range`
    async fn room_availability(
        &self,
        hotel_id: u64,
        range: &DateRange,
        room_type_id: Option<u64>,
    ) -> DeskResult<Vec<RoomAvailability>>;
}

/// Booking resource
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Create a booking. Not idempotent.
    async fn create_booking(&self, booking: &NewBooking) -> DeskResult<Booking>;

    /// Read the current booking record
    async fn get_booking(&self, booking_id: u64) -> DeskResult<BookingDetails>;

    /// Apply a partial update
    async fn patch_booking(&self, booking_id: u64, patch: &BookingPatch)
        -> DeskResult<BookingDetails>;

    /// Mark the guest as arrived. The backend rejects repeats.
    async fn check_in(&self, booking_id: u64) -> DeskResult<BookingDetails>;

    /// Mark the guest as departed. The backend rejects repeats.
    async fn check_out(&self, booking_id: u64) -> DeskResult<BookingDetails>;
}

/// Pricing / currency conversion
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Booking snapshot with its current conversion records
    async fn fetch_conversions(&self, booking_id: u64) -> DeskResult<ConversionSnapshot>;
}

/// Mobile-money charge request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentInitiation {
    /// Payer's wallet number
    pub payee: PhoneNumber,
    /// Reference the backend assigned to the booking
    pub payment_reference: String,
    /// Authoritative converted amount
    pub amount: Money,
}

/// Gateway answer to an initiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentInitiationResult {
    Accepted { transaction_id: String },
    Declined { message: String },
}

/// Mobile-money payment gateway
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a charge. Single-shot; never retried automatically.
    async fn initiate(&self, request: &PaymentInitiation) -> DeskResult<PaymentInitiationResult>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Source of "today" for date validation
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the desk's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock stuck on one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Handles to every collaborator the workflow needs
#[derive(Clone)]
pub struct Collaborators {
    pub inventory: Arc<dyn InventoryService>,
    pub bookings: Arc<dyn BookingService>,
    pub conversions: Arc<dyn ConversionService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Bundle one backend implementing the three resource traits with a gateway
    pub fn new<B>(backend: Arc<B>, payments: Arc<dyn PaymentGateway>) -> Self
    where
        B: InventoryService + BookingService + ConversionService + 'static,
    {
        Self {
            inventory: backend.clone(),
            bookings: backend.clone(),
            conversions: backend,
            payments,
            clock: Arc::new(SystemClock),
        }
    }

    /// Builder: replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("payments", &self.payments.provider_name())
            .finish_non_exhaustive()
    }
}
