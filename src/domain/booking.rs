use chrono::{SecondsFormat, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use super::reservation::{
    ConflictError, DateWindow, Reservation, ReservationRepository, ReserveOutcome, Slot,
    ValidationError,
};
use super::DataAccessError;

/// Booking operation errors, one variant per taxonomy class.
#[derive(Error, Display, Debug)]
pub enum BookingError {
    #[display(fmt = "{}", _0)]
    Validation(#[error(source)] ValidationError),
    #[display(fmt = "{}", _0)]
    Conflict(#[error(source)] ConflictError),
    #[display(fmt = "Reservation not found")]
    NotFound,
    #[display(fmt = "{}", _0)]
    Store(#[error(source)] DataAccessError),
}

impl From<ValidationError> for BookingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConflictError> for BookingError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<DataAccessError> for BookingError {
    fn from(value: DataAccessError) -> Self {
        Self::Store(value)
    }
}

/// Arguments for `create_reservation`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateReservation {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
}

/// Arguments for `check_availability`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckAvailability {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Arguments for `list_reservations`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListReservations {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Arguments for `cancel_reservation`; `id` wins when both keys are given.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CancelReservation {
    pub id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Availability answer for a candidate window.
#[derive(Clone, Debug, Serialize)]
pub struct Availability {
    pub available: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictEntry>,
}

/// A stored reservation blocking the candidate window.
#[derive(Clone, Debug, Serialize)]
pub struct ConflictEntry {
    pub start_time: String,
    pub end_time: String,
    pub description: String,
}

impl From<Reservation> for ConflictEntry {
    fn from(value: Reservation) -> Self {
        Self {
            start_time: value.start_time,
            end_time: value.end_time,
            description: value.description,
        }
    }
}

/// Listing payload: matching reservations plus their count.
#[derive(Clone, Debug, Serialize)]
pub struct ReservationList {
    pub reservations: Vec<Reservation>,
    pub count: usize,
}

/// The four reservation operations over a store.
#[derive(Clone, Debug)]
pub struct BookingService<R> {
    repository: R,
}

impl<R: ReservationRepository> BookingService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Books the requested window unless it is invalid or already taken.
    pub async fn create(&self, args: CreateReservation) -> Result<Reservation, BookingError> {
        let slot = Self::required_window(args.start_time, args.end_time)?;
        slot.validate()?;
        let description = args.description.unwrap_or_default();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        match self
            .repository
            .reserve(&slot, &description, &created_at)
            .await?
        {
            ReserveOutcome::Created(reservation) => Ok(reservation),
            ReserveOutcome::Overlap => Err(ConflictError::SlotTaken.into()),
            ReserveOutcome::Duplicate => Err(ConflictError::DuplicateSlot.into()),
        }
    }

    /// Reports whether the window is free, listing any blocking reservations.
    pub async fn check_availability(
        &self,
        args: CheckAvailability,
    ) -> Result<Availability, BookingError> {
        let slot = Self::required_window(args.start_time, args.end_time)?;
        let conflicts = self.repository.find_overlapping(&slot).await?;
        Ok(Availability {
            available: conflicts.is_empty(),
            conflicts: conflicts.into_iter().map(ConflictEntry::from).collect(),
        })
    }

    /// Lists reservations ascending by start time; the date filter applies
    /// only when both bounds are given and keeps fully contained windows.
    pub async fn list(&self, args: ListReservations) -> Result<ReservationList, BookingError> {
        let window = match (args.start_date, args.end_date) {
            (Some(start_date), Some(end_date)) => Some(DateWindow {
                start_date,
                end_date,
            }),
            _ => None,
        };
        let reservations = self.repository.list(window.as_ref()).await?;
        let count = reservations.len();
        Ok(ReservationList {
            reservations,
            count,
        })
    }

    /// Deletes the reservation identified by id, or by the exact window.
    pub async fn cancel(&self, args: CancelReservation) -> Result<(), BookingError> {
        let removed = match (args.id, args.start_time, args.end_time) {
            (Some(id), _, _) => self.repository.delete_by_id(id).await?,
            (None, Some(start_time), Some(end_time)) => {
                self.repository
                    .delete_by_slot(&Slot::new(start_time, end_time))
                    .await?
            }
            _ => return Err(ValidationError::CancelKeyRequired.into()),
        };
        if removed == 0 {
            return Err(BookingError::NotFound);
        }
        Ok(())
    }

    fn required_window(
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Result<Slot, ValidationError> {
        match (start_time, end_time) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Ok(Slot::new(start, end))
            }
            _ => Err(ValidationError::TimeRangeRequired),
        }
    }
}
