use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ReminderType;

/// Dedup ledger row: at most one per (order_id, reminder_type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: i64,
    pub order_id: i64,
    pub reminder_type: ReminderType,
    pub sent_at: NaiveDateTime,
}
