//! Shared service handles for the HTTP surface.
//!
//! Built once at startup and wrapped in `Arc`. Nothing here is mutable:
//! every request opens its own database connection.

use std::sync::Arc;

use rusqlite::Connection;

use crate::db::{Database, DatabaseError};
use crate::notify::MessageTransport;
use crate::pipeline::intake::ExtractionClient;
use crate::registry::Registry;
use crate::reminders::Clock;

pub struct CoreState {
    pub db: Database,
    pub registry: Arc<Registry>,
    pub extractor: Arc<dyn ExtractionClient>,
    pub transport: Arc<dyn MessageTransport>,
    pub clock: Arc<dyn Clock>,
}

impl CoreState {
    pub fn new(
        db: Database,
        registry: Arc<Registry>,
        extractor: Arc<dyn ExtractionClient>,
        transport: Arc<dyn MessageTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            registry,
            extractor,
            transport,
            clock,
        }
    }

    /// Open a fresh connection to the order database.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        self.db.open()
    }
}
