use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::IntakeError;

/// Fields pulled out of the dispatcher's text by the extraction
/// service, before registry matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedOrder {
    pub technician_name: Option<String>,
    pub doctor_name: Option<String>,
    pub patient_name: Option<String>,
    pub work_type: String,
    pub quantity: Option<u32>,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// An order after extraction and registry resolution, shown to the
/// dispatcher for confirmation. Unresolved names keep the extracted
/// text and carry no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCandidate {
    pub technician_name: Option<String>,
    pub technician_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub doctor_id: Option<i64>,
    pub patient_name: Option<String>,
    pub work_type: String,
    pub work_type_id: Option<i64>,
    pub quantity: Option<u32>,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Chat-completion style extraction service (allows mocking).
pub trait ExtractionClient: Send + Sync {
    /// One request, no retry. Returns the raw completion text.
    fn complete(&self, system: &str, user: &str) -> Result<String, IntakeError>;
}
