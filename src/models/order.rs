use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::OrderStatus;

/// A persisted work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub doctor_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub patient_name: Option<String>,
    pub work_type: String,
    pub quantity: u32,
    pub deadline: NaiveDate,
    /// Dispatcher's original text, kept for audit.
    pub description: String,
    pub photo_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: NaiveDateTime,
}

/// Validated order data ready for insertion. The id, status and
/// creation time are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub doctor_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub patient_name: Option<String>,
    pub work_type: String,
    pub quantity: u32,
    pub deadline: NaiveDate,
    pub description: String,
    pub photo_id: Option<String>,
}
