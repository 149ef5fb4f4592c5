pub mod booking;
pub mod reservation;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the persistence layer.
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("database connection error: {0}")]
    Connection(BoxError),
    #[error("database query error: {0}")]
    Query(BoxError),
    #[error("unique constraint violation")]
    UniqueViolation,
}
