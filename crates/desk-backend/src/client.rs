//! # Booking Backend Client
//!
//! `reqwest` implementation of the inventory, booking and conversion
//! services against the hotel REST backend.

use crate::config::BackendConfig;
use crate::wire::{
    WireBooking, WireBookingPatch, WireConversionSnapshot, WireErrorBody, WireNewBooking,
    WireRoomAvailability,
};
use async_trait::async_trait;
use desk_core::{
    Booking, BookingDetails, BookingPatch, BookingService, ConversionService,
    ConversionSnapshot, DateRange, DeskError, DeskResult, InventoryService, NewBooking,
    RoomAvailability,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

/// Client for the hotel REST backend
pub struct BackendClient {
    config: BackendConfig,
    client: Client,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: BackendConfig) -> DeskResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeskError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> DeskResult<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    pub fn hotel_id(&self) -> u64 {
        self.config.hotel_id
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", self.config.auth_header())
    }

    /// Send a request and decode a JSON body, mapping HTTP failures onto `DeskError`
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> DeskResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| DeskError::Network(format!("{}: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeskError::Network(format!("{}: {}", what, e)))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body, what));
        }

        serde_json::from_str(&body).map_err(|e| {
            DeskError::Serialization(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

/// Map a non-2xx response.
///
/// Timeouts, throttling and 5xx are transient; 404 is `NotFound`; any
/// other 4xx is a business rejection carrying the backend's message.
fn error_from_response(status: StatusCode, body: &str, what: &str) -> DeskError {
    let message = serde_json::from_str::<WireErrorBody>(body)
        .ok()
        .and_then(WireErrorBody::text)
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        warn!("{} failed with {}: {}", what, status, message);
        DeskError::Network(format!("{}: {}", what, message))
    } else if status == StatusCode::NOT_FOUND {
        DeskError::NotFound(format!("{}: {}", what, message))
    } else {
        error!("{} rejected with {}: {}", what, status, message);
        DeskError::rejected(message)
    }
}

#[async_trait]
impl InventoryService for BackendClient {
    #[instrument(skip(self, range), fields(start = %range.start(), end = %range.end()))]
    async fn room_availability(
        &self,
        hotel_id: u64,
        range: &DateRange,
        room_type_id: Option<u64>,
    ) -> DeskResult<Vec<RoomAvailability>> {
        let url = self
            .config
            .url(&format!("/hotels/{}/rooms/availability", hotel_id));

        let mut query = vec![
            ("start_date", range.start().to_string()),
            ("end_date", range.end().to_string()),
        ];
        if let Some(room_type) = room_type_id {
            query.push(("room_type", room_type.to_string()));
        }

        let rooms: Vec<WireRoomAvailability> = self
            .send_json(self.client.get(&url).query(&query), "room availability")
            .await?;

        debug!("Availability report: {} rooms", rooms.len());

        rooms
            .into_iter()
            .map(WireRoomAvailability::into_core)
            .collect()
    }
}

#[async_trait]
impl BookingService for BackendClient {
    // Guest fields are PII and stay out of the span
    #[instrument(skip(self, booking), fields(room_id = booking.room_id))]
    async fn create_booking(&self, booking: &NewBooking) -> DeskResult<Booking> {
        let url = self.config.url("/bookings");

        let request = self
            .client
            .post(&url)
            .header("Idempotency-Key", &booking.idempotency_key)
            .json(&WireNewBooking::from(booking));

        let created: WireBooking = self.send_json(request, "create booking").await?;
        let created = created.into_booking()?;

        info!("Created booking: id={}, code={}", created.id, created.code);
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_booking(&self, booking_id: u64) -> DeskResult<BookingDetails> {
        let url = self.config.url(&format!("/bookings/{}", booking_id));
        let booking: WireBooking = self.send_json(self.client.get(&url), "get booking").await?;
        booking.into_details()
    }

    #[instrument(skip(self, patch))]
    async fn patch_booking(
        &self,
        booking_id: u64,
        patch: &BookingPatch,
    ) -> DeskResult<BookingDetails> {
        if patch.is_empty() {
            return Err(DeskError::validation("patch", "nothing to update"));
        }

        let url = self.config.url(&format!("/bookings/{}", booking_id));
        let request = self.client.patch(&url).json(&WireBookingPatch::from(patch));

        let booking: WireBooking = self.send_json(request, "patch booking").await?;
        info!("Patched booking {}", booking_id);
        booking.into_details()
    }

    #[instrument(skip(self))]
    async fn check_in(&self, booking_id: u64) -> DeskResult<BookingDetails> {
        let url = self.config.url(&format!("/bookings/{}/check-in", booking_id));
        let booking: WireBooking = self.send_json(self.client.post(&url), "check-in").await?;
        info!("Checked in booking {}", booking_id);
        booking.into_details()
    }

    #[instrument(skip(self))]
    async fn check_out(&self, booking_id: u64) -> DeskResult<BookingDetails> {
        let url = self.config.url(&format!("/bookings/{}/check-out", booking_id));
        let booking: WireBooking = self.send_json(self.client.post(&url), "check-out").await?;
        info!("Checked out booking {}", booking_id);
        booking.into_details()
    }
}

#[async_trait]
impl ConversionService for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_conversions(&self, booking_id: u64) -> DeskResult<ConversionSnapshot> {
        let url = self
            .config
            .url(&format!("/bookings/{}/conversions", booking_id));
        let snapshot: WireConversionSnapshot = self
            .send_json(self.client.get(&url), "fetch conversions")
            .await?;

        debug!(
            "Conversions for booking {}: {}",
            booking_id,
            snapshot.conversions.len()
        );
        snapshot.into_core()
    }
}
