use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use super::{constraint_or_sqlite, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

/// Insert a new order and return its assigned id. Orders are
/// append-only here: no update or delete is offered.
pub fn insert_order(
    conn: &Connection,
    order: &NewOrder,
    created_at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO orders (doctor_id, technician_id, patient_name, work_type, quantity,
         deadline, description, photo_id, created_at, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            order.doctor_id,
            order.technician_id,
            order.patient_name,
            order.work_type,
            order.quantity,
            order.deadline.format(DATE_FORMAT).to_string(),
            order.description,
            order.photo_id,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
            OrderStatus::InProgress.as_str(),
        ],
    )
    .map_err(constraint_or_sqlite)?;
    Ok(conn.last_insert_rowid())
}

pub fn get_order(conn: &Connection, id: i64) -> Result<Option<Order>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, doctor_id, technician_id, patient_name, work_type, quantity, deadline,
                description, photo_id, status, created_at
         FROM orders WHERE id = ?1",
        params![id],
        order_row,
    );

    match result {
        Ok(row) => Ok(Some(order_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_orders(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
    Ok(count)
}

/// In-progress orders due on `deadline` that have no ledger row of
/// `reminder_type` yet, oldest first.
pub fn orders_due_without_reminder(
    conn: &Connection,
    deadline: NaiveDate,
    reminder_type: ReminderType,
) -> Result<Vec<Order>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.doctor_id, o.technician_id, o.patient_name, o.work_type, o.quantity,
                o.deadline, o.description, o.photo_id, o.status, o.created_at
         FROM orders o
         WHERE o.deadline = ?1 AND o.status = ?2
           AND NOT EXISTS (
               SELECT 1 FROM reminders r
               WHERE r.order_id = o.id AND r.reminder_type = ?3
           )
         ORDER BY o.id ASC",
    )?;

    let rows = stmt.query_map(
        params![
            deadline.format(DATE_FORMAT).to_string(),
            OrderStatus::InProgress.as_str(),
            reminder_type.as_str(),
        ],
        order_row,
    )?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(order_from_row(row?)?);
    }
    Ok(orders)
}

struct OrderRow {
    id: i64,
    doctor_id: Option<i64>,
    technician_id: Option<i64>,
    patient_name: Option<String>,
    work_type: String,
    quantity: i64,
    deadline: String,
    description: String,
    photo_id: Option<String>,
    status: String,
    created_at: String,
}

fn order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        technician_id: row.get(2)?,
        patient_name: row.get(3)?,
        work_type: row.get(4)?,
        quantity: row.get(5)?,
        deadline: row.get(6)?,
        description: row.get(7)?,
        photo_id: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn order_from_row(row: OrderRow) -> Result<Order, DatabaseError> {
    let deadline = NaiveDate::parse_from_str(&row.deadline, DATE_FORMAT).map_err(|_| {
        DatabaseError::InvalidValue {
            field: "orders.deadline".into(),
            value: row.deadline.clone(),
        }
    })?;
    let quantity = u32::try_from(row.quantity).map_err(|_| DatabaseError::InvalidValue {
        field: "orders.quantity".into(),
        value: row.quantity.to_string(),
    })?;
    let created_at =
        NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT).map_err(|_| {
            DatabaseError::InvalidValue {
                field: "orders.created_at".into(),
                value: row.created_at.clone(),
            }
        })?;

    Ok(Order {
        id: row.id,
        doctor_id: row.doctor_id,
        technician_id: row.technician_id,
        patient_name: row.patient_name,
        work_type: row.work_type,
        quantity,
        deadline,
        description: row.description,
        photo_id: row.photo_id,
        status: OrderStatus::from_str(&row.status)?,
        created_at,
    })
}
