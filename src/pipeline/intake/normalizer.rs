use std::time::Instant;

use super::parser::parse_extraction_response;
use super::prompt::EXTRACTION_SYSTEM_PROMPT;
use super::types::{ExtractionClient, OrderCandidate};
use super::IntakeError;
use crate::registry::{resolve_candidate, Registry};

/// Display format for deadlines in dispatcher-facing text.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Turns raw order text into a resolved candidate.
pub struct IntakeNormalizer<'a> {
    client: &'a dyn ExtractionClient,
    registry: &'a Registry,
}

impl<'a> IntakeNormalizer<'a> {
    pub fn new(client: &'a dyn ExtractionClient, registry: &'a Registry) -> Self {
        Self { client, registry }
    }

    /// Extract, parse and resolve. A failure here means nothing was
    /// understood; the dispatcher resends and that is a fresh attempt.
    pub fn normalize(&self, text: &str) -> Result<OrderCandidate, IntakeError> {
        if text.trim().is_empty() {
            return Err(IntakeError::EmptyInput);
        }

        let start = Instant::now();
        let result = self.client.complete(EXTRACTION_SYSTEM_PROMPT, text);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = result.map_err(|e| {
            tracing::warn!(elapsed_ms, error = %e, "Extraction request failed");
            e
        })?;
        tracing::debug!(elapsed_ms, "Extraction request completed");

        let extracted = parse_extraction_response(&response).map_err(|reason| {
            tracing::warn!(error = %reason, "Extraction response rejected");
            IntakeError::NormalizationFailed(reason)
        })?;

        Ok(resolve_candidate(self.registry, extracted))
    }
}

/// One-line summary shown to the dispatcher for confirmation.
pub fn format_candidate_summary(candidate: &OrderCandidate) -> String {
    let mut parts = Vec::new();

    if let Some(technician) = &candidate.technician_name {
        parts.push(format!("Техник: {technician}"));
    }
    if let Some(doctor) = &candidate.doctor_name {
        parts.push(format!("Врач: {doctor}"));
    }
    if let Some(patient) = &candidate.patient_name {
        parts.push(format!("Пациент: {patient}"));
    }
    parts.push(format!("Вид работы: {}", candidate.work_type));
    if let Some(quantity) = candidate.quantity {
        parts.push(format!("Количество: {quantity}шт"));
    }
    if let Some(deadline) = candidate.deadline {
        parts.push(format!("Срок: {}", deadline.format(DISPLAY_DATE_FORMAT)));
    }
    if let Some(notes) = &candidate.notes {
        parts.push(format!("Заметки: {notes}"));
    }

    format!("{}.", parts.join(". "))
}
