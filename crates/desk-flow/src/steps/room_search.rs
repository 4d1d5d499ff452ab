//! Step 1: search availability and pick a room.

use chrono::NaiveDate;
use desk_core::{
    fully_available_rooms, DateRange, DeskError, DeskResult, InventoryService, RoomSummary, Step,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// What the desk clerk searches for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub room_type_id: Option<u64>,
}

/// Latest search and its offer list
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoomSearch {
    in_flight: bool,
    range: Option<DateRange>,
    offered: Vec<RoomSummary>,
}

impl RoomSearch {
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn offered(&self) -> &[RoomSummary] {
        &self.offered
    }

    /// Range of the latest completed search
    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    /// Run a search, replacing any previous results.
    ///
    /// Invalid ranges fail locally and never reach the inventory service.
    #[instrument(skip(self, inventory))]
    pub async fn run(
        &mut self,
        inventory: &dyn InventoryService,
        hotel_id: u64,
        criteria: &SearchCriteria,
        today: NaiveDate,
    ) -> DeskResult<&[RoomSummary]> {
        let range = DateRange::for_booking(criteria.start_date, criteria.end_date, today)?;

        self.in_flight = true;
        self.range = None;
        self.offered.clear();

        let report = inventory
            .room_availability(hotel_id, &range, criteria.room_type_id)
            .await;
        self.in_flight = false;
        let report = report?;

        self.offered = fully_available_rooms(&report, &range);
        self.range = Some(range);

        debug!(
            "{} of {} rooms free for every night",
            self.offered.len(),
            report.len()
        );
        info!("Room search complete: {} offered", self.offered.len());
        Ok(&self.offered)
    }

    /// A room from the latest result, with the searched range
    pub fn pick(&self, room_id: u64) -> DeskResult<(RoomSummary, DateRange)> {
        if self.in_flight {
            return Err(DeskError::guard(
                Step::SelectRoom,
                "a search is still running; wait for its result",
            ));
        }
        let range = self
            .range
            .ok_or_else(|| DeskError::guard(Step::SelectRoom, "search for rooms first"))?;
        let room = self
            .offered
            .iter()
            .find(|r| r.id == room_id)
            .cloned()
            .ok_or_else(|| {
                DeskError::guard(
                    Step::SelectRoom,
                    format!("room {} is not available for the searched dates", room_id),
                )
            })?;
        Ok((room, range))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
