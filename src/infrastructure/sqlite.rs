use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::domain::reservation::{
    DateWindow, Reservation, ReservationRepository, ReserveOutcome, Slot,
};
use crate::domain::DataAccessError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(start_time, end_time)
)";

const COLUMNS: &str = "id, start_time, end_time, description, created_at";

/// Overlap predicate against the window bound as `?1 = start, ?2 = end`, in
/// the store's three-clause form: left-overlap, right-overlap, containment.
/// Equivalent to `start_time < ?2 AND end_time > ?1`.
const OVERLAPPING: &str = "(start_time <= ?1 AND end_time > ?1)
       OR (start_time < ?2 AND end_time >= ?2)
       OR (start_time >= ?1 AND end_time <= ?2)";

/// SQLite-backed reservation store over an sqlx connection pool.
#[derive(Clone, Debug)]
pub struct SqliteReservationRepository {
    pool: SqlitePool,
}

impl SqliteReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pooled connection to `url`, creating the database file if
    /// missing.
    pub async fn connect(url: &str) -> Result<Self, DataAccessError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Creates the reservations table if absent. Safe to call on every start.
    pub async fn init_schema(&self) -> Result<(), DataAccessError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for SqliteReservationRepository {
    async fn reserve(
        &self,
        slot: &Slot,
        description: &str,
        created_at: &str,
    ) -> Result<ReserveOutcome, DataAccessError> {
        // Check and insert share one write transaction; competing reserves
        // serialize behind it.
        let mut tx = self.pool.begin().await?;
        let taken: Option<(i64,)> =
            sqlx::query_as(&format!("SELECT id FROM reservations WHERE {OVERLAPPING} LIMIT 1"))
                .bind(&slot.start_time)
                .bind(&slot.end_time)
                .fetch_optional(&mut *tx)
                .await?;
        if taken.is_some() {
            return Ok(ReserveOutcome::Overlap);
        }
        let inserted = sqlx::query_as::<_, Reservation>(&format!(
            "INSERT INTO reservations (start_time, end_time, description, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {COLUMNS}"
        ))
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .bind(description)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await;
        match inserted {
            Ok(reservation) => {
                tx.commit().await?;
                Ok(ReserveOutcome::Created(reservation))
            }
            Err(error) => match DataAccessError::from(error) {
                DataAccessError::UniqueViolation => Ok(ReserveOutcome::Duplicate),
                other => Err(other),
            },
        }
    }

    async fn find_overlapping(&self, slot: &Slot) -> Result<Vec<Reservation>, DataAccessError> {
        let rows = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {COLUMNS} FROM reservations WHERE {OVERLAPPING} ORDER BY start_time ASC"
        ))
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list(&self, window: Option<&DateWindow>) -> Result<Vec<Reservation>, DataAccessError> {
        let rows = match window {
            Some(window) => {
                sqlx::query_as::<_, Reservation>(&format!(
                    "SELECT {COLUMNS} FROM reservations
                     WHERE start_time >= ?1 AND end_time <= ?2
                     ORDER BY start_time ASC"
                ))
                .bind(&window.start_date)
                .bind(&window.end_date)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Reservation>(&format!(
                    "SELECT {COLUMNS} FROM reservations ORDER BY start_time ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, DataAccessError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_slot(&self, slot: &Slot) -> Result<u64, DataAccessError> {
        let result = sqlx::query("DELETE FROM reservations WHERE start_time = ?1 AND end_time = ?2")
            .bind(&slot.start_time)
            .bind(&slot.end_time)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
