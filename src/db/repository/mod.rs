//! Repository layer: entity-scoped database operations.

mod order;
mod reminder;
mod scheduler_state;
mod user;

use super::DatabaseError;

/// Stored calendar dates (deadlines, sweep marker).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Stored local timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub use order::*;
pub use reminder::*;
pub use scheduler_state::*;
pub use user::*;

/// Surface SQLite constraint failures (NOT NULL, CHECK, UNIQUE, FK)
/// as `ConstraintViolation`; everything else stays a plain SQLite error.
pub(crate) fn constraint_or_sqlite(e: rusqlite::Error) -> DatabaseError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(
                msg.clone().unwrap_or_else(|| err.to_string()),
            )
        }
        other => DatabaseError::Sqlite(other),
    }
}
