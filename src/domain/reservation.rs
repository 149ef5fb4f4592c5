use async_trait::async_trait;
use chrono::DateTime;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::domain::DataAccessError;

/// Reservation repository seam.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Inserts a reservation for `slot` unless a stored window overlaps it.
    /// The overlap check and the insert are atomic with respect to other
    /// `reserve` calls.
    async fn reserve(
        &self,
        slot: &Slot,
        description: &str,
        created_at: &str,
    ) -> Result<ReserveOutcome, DataAccessError>;
    /// All stored reservations overlapping `slot`, ascending by start time.
    async fn find_overlapping(&self, slot: &Slot) -> Result<Vec<Reservation>, DataAccessError>;
    /// All reservations, restricted to those fully contained in `window`
    /// when one is given, ascending by start time.
    async fn list(&self, window: Option<&DateWindow>) -> Result<Vec<Reservation>, DataAccessError>;
    /// Deletes by id, returning the number of rows removed.
    async fn delete_by_id(&self, id: i64) -> Result<u64, DataAccessError>;
    /// Deletes the reservation matching the exact window, returning the
    /// number of rows removed.
    async fn delete_by_slot(&self, slot: &Slot) -> Result<u64, DataAccessError>;
}

/// A booked time interval with optional description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
}

impl Reservation {
    pub fn slot(&self) -> Slot {
        Slot::new(self.start_time.clone(), self.end_time.clone())
    }
}

/// Half-open `[start_time, end_time)` window, kept as the caller's raw
/// ISO-8601 text. Comparisons are textual, matching the store's TEXT columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub start_time: String,
    pub end_time: String,
}

impl Slot {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Two windows conflict iff each one starts before the other ends.
    /// Windows touching at an endpoint do not overlap.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Checks that both bounds parse as ISO-8601 timestamps (a trailing `Z`
    /// is accepted as `+00:00`) and that the window runs forward in time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let start = DateTime::parse_from_rfc3339(&self.start_time)
            .map_err(|_| ValidationError::MalformedTimestamp)?;
        let end = DateTime::parse_from_rfc3339(&self.end_time)
            .map_err(|_| ValidationError::MalformedTimestamp)?;
        if end <= start {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(())
    }
}

/// Date filter for listing; it only applies when both bounds are present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start_date: String,
    pub end_date: String,
}

/// Outcome of an atomic reserve attempt.
#[derive(Debug)]
pub enum ReserveOutcome {
    Created(Reservation),
    /// A stored window overlaps the requested one.
    Overlap,
    /// The exact `(start_time, end_time)` pair is already stored; only
    /// reachable when a concurrent reserve wins the race to the unique index.
    Duplicate,
}

/// Input validation errors; raised before any store access.
#[derive(Error, Display, Debug)]
pub enum ValidationError {
    #[display(fmt = "start_time and end_time are required")]
    TimeRangeRequired,
    #[display(fmt = "Invalid datetime format. Use ISO 8601 format (e.g., 2024-01-15T10:00:00Z)")]
    MalformedTimestamp,
    #[display(fmt = "end_time must be after start_time")]
    EndNotAfterStart,
    #[display(fmt = "Either 'id' or both 'start_time' and 'end_time' are required")]
    CancelKeyRequired,
}

/// A requested window collides with stored state.
#[derive(Error, Display, Debug)]
pub enum ConflictError {
    #[display(fmt = "Time slot conflicts with existing reservation")]
    SlotTaken,
    #[display(fmt = "Reservation already exists for this time slot")]
    DuplicateSlot,
}
