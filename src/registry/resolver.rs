//! Reference Resolver: attaches registry ids to extracted names.
//!
//! Each field is resolved on its own. A miss is a normal outcome: the
//! id stays empty and the extracted text is kept exactly as it came in.

use super::{Registry, RegistryKind};
use crate::pipeline::intake::{ExtractedOrder, OrderCandidate};

/// Result of resolving one free-text field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub text: String,
    pub id: Option<i64>,
}

/// Resolve a single optional field. Resolved fields take the
/// registry's canonical spelling; unresolved ones are returned as-is.
pub fn resolve_field(registry: &Registry, kind: RegistryKind, text: &str) -> ResolvedField {
    match registry.find(kind, text) {
        Some(entry) => ResolvedField {
            text: entry.name.clone(),
            id: Some(entry.id),
        },
        None => ResolvedField {
            text: text.to_string(),
            id: None,
        },
    }
}

fn resolve_optional(
    registry: &Registry,
    kind: RegistryKind,
    text: Option<String>,
) -> (Option<String>, Option<i64>) {
    match text {
        Some(text) => {
            let resolved = resolve_field(registry, kind, &text);
            if resolved.id.is_none() {
                tracing::debug!(kind = kind.as_str(), text = %text, "No registry match");
            }
            (Some(resolved.text), resolved.id)
        }
        None => (None, None),
    }
}

/// Resolve technician, doctor and work type of an extracted order.
/// Never fails.
pub fn resolve_candidate(registry: &Registry, extracted: ExtractedOrder) -> OrderCandidate {
    let (technician_name, technician_id) =
        resolve_optional(registry, RegistryKind::Technician, extracted.technician_name);
    let (doctor_name, doctor_id) =
        resolve_optional(registry, RegistryKind::Doctor, extracted.doctor_name);
    let work_type = resolve_field(registry, RegistryKind::WorkType, &extracted.work_type);

    OrderCandidate {
        technician_name,
        technician_id,
        doctor_name,
        doctor_id,
        patient_name: extracted.patient_name,
        work_type: work_type.text,
        work_type_id: work_type.id,
        quantity: extracted.quantity,
        deadline: extracted.deadline,
        notes: extracted.notes,
    }
}
