use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::DATE_FORMAT;
use crate::db::DatabaseError;

const LAST_SWEEP_DATE_KEY: &str = "last_sweep_date";

/// Date of the last reminder sweep (or skipped late window), if any.
pub fn get_last_sweep_date(conn: &Connection) -> Result<Option<NaiveDate>, DatabaseError> {
    let result = conn.query_row(
        "SELECT value FROM scheduler_state WHERE key = ?1",
        params![LAST_SWEEP_DATE_KEY],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(value) => NaiveDate::parse_from_str(&value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| DatabaseError::InvalidValue {
                field: LAST_SWEEP_DATE_KEY.into(),
                value,
            }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_last_sweep_date(conn: &Connection, date: NaiveDate) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO scheduler_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![LAST_SWEEP_DATE_KEY, date.format(DATE_FORMAT).to_string()],
    )?;
    Ok(())
}
