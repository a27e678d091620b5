use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{constraint_or_sqlite, TIMESTAMP_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

/// Insert the ledger row for `(order_id, reminder_type)` if absent.
///
/// Returns `true` when this call created the row, `false` when it
/// already existed. The check and the mark are one statement, so two
/// sweeps racing on the same order cannot both claim it.
pub fn claim_reminder(
    conn: &Connection,
    order_id: i64,
    reminder_type: ReminderType,
    sent_at: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO reminders (order_id, reminder_type, sent_at)
             VALUES (?1, ?2, ?3)",
            params![
                order_id,
                reminder_type.as_str(),
                sent_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
        .map_err(constraint_or_sqlite)?;
    Ok(inserted == 1)
}

pub fn reminder_exists(
    conn: &Connection,
    order_id: i64,
    reminder_type: ReminderType,
) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reminders WHERE order_id = ?1 AND reminder_type = ?2)",
        params![order_id, reminder_type.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn count_reminders(conn: &Connection, order_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE order_id = ?1",
        params![order_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
