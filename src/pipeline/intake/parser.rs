use chrono::NaiveDate;
use serde::Deserialize;

use super::types::ExtractedOrder;
use super::FailureReason;

/// Deadline formats accepted from the service: the requested one
/// first, ISO as a fallback.
const DEADLINE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// Parse the extraction service's answer into an `ExtractedOrder`.
///
/// The answer must be a single JSON object, optionally inside a
/// ```json fence. Wrong field types, a missing work type or an
/// unreadable deadline all reject the whole answer.
pub fn parse_extraction_response(response: &str) -> Result<ExtractedOrder, FailureReason> {
    #[derive(Deserialize)]
    struct RawExtraction {
        technician_name: Option<String>,
        doctor_name: Option<String>,
        patient_name: Option<String>,
        work_type: Option<String>,
        quantity: Option<u32>,
        deadline: Option<String>,
        notes: Option<String>,
    }

    let json = strip_code_fence(response);
    let raw: RawExtraction = serde_json::from_str(json)
        .map_err(|e| FailureReason::MalformedResponse(e.to_string()))?;

    let work_type = non_blank(raw.work_type)
        .ok_or_else(|| FailureReason::MalformedResponse("work_type is missing".into()))?;

    let deadline = match non_blank(raw.deadline) {
        Some(text) => Some(parse_deadline(&text).ok_or_else(|| {
            FailureReason::MalformedResponse(format!("unreadable deadline: {text}"))
        })?),
        None => None,
    };

    Ok(ExtractedOrder {
        technician_name: non_blank(raw.technician_name),
        doctor_name: non_blank(raw.doctor_name),
        patient_name: non_blank(raw.patient_name),
        work_type,
        quantity: raw.quantity,
        deadline,
        notes: non_blank(raw.notes),
    })
}

pub fn parse_deadline(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DEADLINE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Unwrap a ```json ... ``` (or bare ```) fence if the model added one.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_example_answer() {
        let order = parse_extraction_response(
            r#"{"technician_name": "Мороков", "work_type": "циркон на винте", "quantity": 7, "deadline": null, "patient_name": "Иванов", "notes": ""}"#,
        )
        .unwrap();

        assert_eq!(order.technician_name.as_deref(), Some("Мороков"));
        assert_eq!(order.work_type, "циркон на винте");
        assert_eq!(order.quantity, Some(7));
        assert_eq!(order.deadline, None);
        assert_eq!(order.patient_name.as_deref(), Some("Иванов"));
        assert_eq!(order.doctor_name, None);
        assert_eq!(order.notes, None);
    }

    #[test]
    fn parses_dotted_deadline() {
        let order = parse_extraction_response(
            r#"{"technician_name": "Козлов", "work_type": "виниры", "quantity": 5, "deadline": "15.02.2026", "doctor_name": "Иванов", "patient_name": "Сидоров"}"#,
        )
        .unwrap();
        assert_eq!(order.deadline, NaiveDate::from_ymd_opt(2026, 2, 15));
        assert_eq!(order.doctor_name.as_deref(), Some("Иванов"));
    }

    #[test]
    fn accepts_iso_deadline() {
        assert_eq!(parse_deadline("2026-02-15"), NaiveDate::from_ymd_opt(2026, 2, 15));
    }

    #[test]
    fn accepts_fenced_json() {
        let response = "```json\n{\"work_type\": \"мк\", \"quantity\": 2}\n```";
        let order = parse_extraction_response(response).unwrap();
        assert_eq!(order.work_type, "мк");
        assert_eq!(order.quantity, Some(2));
    }

    #[test]
    fn rejects_prose() {
        let err = parse_extraction_response("Конечно! Вот ваш заказ: техник Мороков").unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_truncated_json() {
        let err = parse_extraction_response(r#"{"work_type": "мк", "quantity": "#).unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_missing_work_type() {
        let err = parse_extraction_response(r#"{"technician_name": "Мороков", "quantity": 7}"#)
            .unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_quantity_as_text() {
        let err = parse_extraction_response(r#"{"work_type": "мк", "quantity": "7шт"}"#)
            .unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_negative_quantity() {
        let err = parse_extraction_response(r#"{"work_type": "мк", "quantity": -3}"#).unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_relative_deadline() {
        let err = parse_extraction_response(r#"{"work_type": "мк", "deadline": "завтра"}"#)
            .unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }

    #[test]
    fn rejects_json_array() {
        let err = parse_extraction_response(r#"[{"work_type": "мк"}]"#).unwrap_err();
        assert!(matches!(err, FailureReason::MalformedResponse(_)));
    }
}
