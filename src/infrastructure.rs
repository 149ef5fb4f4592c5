pub mod sqlite;
pub mod toolcall;
pub mod web;

use crate::domain::DataAccessError;

impl From<sqlx::Error> for DataAccessError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(ref e) if e.is_unique_violation() => Self::UniqueViolation,
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(Box::new(value)),
            _ => Self::Query(Box::new(value)),
        }
    }
}
