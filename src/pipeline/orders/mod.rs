//! Order confirmation: validate the dispatcher-approved candidate,
//! persist it, then notify.

pub mod create;

pub use create::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::registry::RegistryKind;

/// What the dispatcher is told when the order could not be saved.
pub const STORAGE_FAILURE_PROMPT: &str =
    "Не удалось сохранить заказ. Повторите попытку или отмените заказ.";

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Deadline is required")]
    MissingDeadline,

    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    #[error("Work type is required")]
    MissingWorkType,

    #[error("Unknown {kind} reference: {id}")]
    UnknownReference { kind: RegistryKind, id: i64 },

    #[error("Failed to store order: {0}")]
    Storage(#[from] DatabaseError),
}

impl OrderError {
    /// Validation failures the dispatcher can fix by editing the order.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
