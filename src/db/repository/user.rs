use std::str::FromStr;

use rusqlite::{params, Connection};

use super::{constraint_or_sqlite, TIMESTAMP_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

/// Register a user binding. Registration itself is handled elsewhere;
/// this exists for seeding and tests.
pub fn insert_user(
    conn: &Connection,
    external_identity: i64,
    name: &str,
    role: UserRole,
    reference_id: Option<i64>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (external_identity, name, role, reference_id, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![
            external_identity,
            name,
            role.as_str(),
            reference_id,
            chrono::Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string(),
        ],
    )
    .map_err(constraint_or_sqlite)?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
pub fn set_user_active(conn: &Connection, id: i64, active: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = ?1 WHERE id = ?2",
        params![active as i32, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// The active user bound to a registry reference in the given role.
/// When several bindings exist the earliest registered wins.
pub fn find_active_user(
    conn: &Connection,
    role: UserRole,
    reference_id: i64,
) -> Result<Option<UserBinding>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, external_identity, name, role, reference_id, is_active
         FROM users
         WHERE role = ?1 AND reference_id = ?2 AND is_active = 1
         ORDER BY id ASC LIMIT 1",
        params![role.as_str(), reference_id],
        user_row,
    );

    match result {
        Ok(row) => Ok(Some(user_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn active_users_with_role(
    conn: &Connection,
    role: UserRole,
) -> Result<Vec<UserBinding>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, external_identity, name, role, reference_id, is_active
         FROM users WHERE role = ?1 AND is_active = 1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![role.as_str()], user_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

struct UserRow {
    id: i64,
    external_identity: i64,
    name: String,
    role: String,
    reference_id: Option<i64>,
    is_active: i32,
}

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        external_identity: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        reference_id: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn user_from_row(row: UserRow) -> Result<UserBinding, DatabaseError> {
    Ok(UserBinding {
        id: row.id,
        external_identity: row.external_identity,
        name: row.name,
        role: UserRole::from_str(&row.role)?,
        reference_id: row.reference_id,
        is_active: row.is_active != 0,
    })
}
