use std::sync::Mutex;

use async_trait::async_trait;

use super::reservation::{
    DateWindow, Reservation, ReservationRepository, ReserveOutcome, Slot,
};
use super::DataAccessError;

/// Vec-backed store for exercising the operations without SQLite; conflict
/// queries go through the pure `Slot::overlaps` predicate.
#[derive(Debug, Default)]
pub(crate) struct MemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: Vec<Reservation>,
}

#[async_trait]
impl ReservationRepository for MemoryRepository {
    async fn reserve(
        &self,
        slot: &Slot,
        description: &str,
        created_at: &str,
    ) -> Result<ReserveOutcome, DataAccessError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.rows.iter().any(|row| row.slot().overlaps(slot)) {
            return Ok(ReserveOutcome::Overlap);
        }
        inner.next_id += 1;
        let reservation = Reservation {
            id: inner.next_id,
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            description: description.to_owned(),
            created_at: created_at.to_owned(),
        };
        inner.rows.push(reservation.clone());
        Ok(ReserveOutcome::Created(reservation))
    }

    async fn find_overlapping(&self, slot: &Slot) -> Result<Vec<Reservation>, DataAccessError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|row| row.slot().overlaps(slot))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(rows)
    }

    async fn list(&self, window: Option<&DateWindow>) -> Result<Vec<Reservation>, DataAccessError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Reservation> = inner
            .rows
            .iter()
            .filter(|row| match window {
                Some(window) => {
                    row.start_time >= window.start_date && row.end_time <= window.end_date
                }
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, DataAccessError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|row| row.id != id);
        Ok((before - inner.rows.len()) as u64)
    }

    async fn delete_by_slot(&self, slot: &Slot) -> Result<u64, DataAccessError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner
            .rows
            .retain(|row| row.start_time != slot.start_time || row.end_time != slot.end_time);
        Ok((before - inner.rows.len()) as u64)
    }
}
