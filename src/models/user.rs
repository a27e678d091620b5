use serde::{Deserialize, Serialize};

use super::enums::UserRole;

/// Maps a registry reference to a deliverable chat. Owned by the
/// registration flow; the order pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBinding {
    pub id: i64,
    /// Messaging identity (Telegram chat id).
    pub external_identity: i64,
    pub name: String,
    pub role: UserRole,
    pub reference_id: Option<i64>,
    pub is_active: bool,
}
