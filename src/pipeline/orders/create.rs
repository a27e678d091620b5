use chrono::{NaiveDateTime, SubsecRound};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::models::{NewOrder, Order, OrderStatus};
use crate::notify::{DispatchReport, MessageTransport, NotificationDispatcher, OrderNotice};
use crate::pipeline::intake::OrderCandidate;
use crate::registry::{Registry, RegistryKind};

use super::OrderError;

/// A candidate the dispatcher has confirmed, possibly after editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub candidate: OrderCandidate,
    /// Dispatcher's original message, stored as the order description.
    pub raw_text: String,
    #[serde(default)]
    pub photo_ref: Option<String>,
    pub dispatcher_chat_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreated {
    pub order: Order,
    pub notifications: DispatchReport,
}

/// Check the confirmed candidate and turn it into insertable data.
/// Never touches the store.
pub fn validate_confirmation(
    registry: &Registry,
    confirm: &ConfirmOrder,
) -> Result<NewOrder, OrderError> {
    let candidate = &confirm.candidate;

    let work_type = candidate.work_type.trim();
    if work_type.is_empty() {
        return Err(OrderError::MissingWorkType);
    }
    let quantity = match candidate.quantity {
        Some(q) if q > 0 => q,
        _ => return Err(OrderError::InvalidQuantity),
    };
    let deadline = candidate.deadline.ok_or(OrderError::MissingDeadline)?;

    for (kind, id) in [
        (RegistryKind::Technician, candidate.technician_id),
        (RegistryKind::Doctor, candidate.doctor_id),
        (RegistryKind::WorkType, candidate.work_type_id),
    ] {
        if let Some(id) = id {
            if !registry.contains(kind, id) {
                return Err(OrderError::UnknownReference { kind, id });
            }
        }
    }

    Ok(NewOrder {
        doctor_id: candidate.doctor_id,
        technician_id: candidate.technician_id,
        patient_name: candidate
            .patient_name
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from),
        work_type: work_type.to_string(),
        quantity,
        deadline,
        description: confirm.raw_text.clone(),
        photo_id: confirm.photo_ref.clone().filter(|p| !p.is_empty()),
    })
}

/// Validate, store, then notify. Notification failures are reported in
/// `OrderCreated::notifications` and never fail the call; a storage
/// failure returns before any notification is attempted.
pub fn create_order(
    conn: &Connection,
    registry: &Registry,
    transport: &dyn MessageTransport,
    confirm: &ConfirmOrder,
    now: NaiveDateTime,
) -> Result<OrderCreated, OrderError> {
    let new_order = validate_confirmation(registry, confirm)?;
    // Stored timestamps carry whole seconds.
    let created_at = now.trunc_subsecs(0);

    let order_id = repository::insert_order(conn, &new_order, created_at).map_err(|e| {
        tracing::warn!(error = %e, "Order insert failed");
        OrderError::Storage(e)
    })?;
    let order = stored_order(order_id, new_order, created_at);

    tracing::info!(
        order_id,
        technician_id = ?order.technician_id,
        doctor_id = ?order.doctor_id,
        deadline = %order.deadline,
        "Order created"
    );

    let notice = OrderNotice {
        order: &order,
        technician_name: confirm.candidate.technician_name.as_deref(),
        doctor_name: confirm.candidate.doctor_name.as_deref(),
    };
    let notifications = NotificationDispatcher::new(transport).notify_order_created(
        conn,
        &notice,
        confirm.dispatcher_chat_id,
    );

    Ok(OrderCreated {
        order,
        notifications,
    })
}

fn stored_order(id: i64, new_order: NewOrder, created_at: NaiveDateTime) -> Order {
    Order {
        id,
        doctor_id: new_order.doctor_id,
        technician_id: new_order.technician_id,
        patient_name: new_order.patient_name,
        work_type: new_order.work_type,
        quantity: new_order.quantity,
        deadline: new_order.deadline,
        description: new_order.description,
        photo_id: new_order.photo_id,
        status: OrderStatus::InProgress,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::UserRole;
    use crate::notify::{DeliveryStatus, RecipientRole, RecordingTransport, SkipReason};
    use crate::pipeline::intake::{IntakeError, IntakeNormalizer, MockExtractionClient, RESEND_PROMPT};
    use crate::registry::tests::sample_registry;

    const TECH_CHAT: i64 = 1001;
    const DISPATCHER_CHAT: i64 = 3001;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn candidate() -> OrderCandidate {
        OrderCandidate {
            technician_name: Some("Мороков".into()),
            technician_id: Some(1),
            doctor_name: Some("Иванов".into()),
            doctor_id: Some(1),
            patient_name: Some("Смирнова".into()),
            work_type: "Циркон на винте".into(),
            work_type_id: Some(1),
            quantity: Some(2),
            deadline: NaiveDate::from_ymd_opt(2026, 10, 20),
            notes: None,
        }
    }

    fn confirm(candidate: OrderCandidate) -> ConfirmOrder {
        ConfirmOrder {
            candidate,
            raw_text: "Мороков циркон на винте 2шт Иванов Смирнова до 20.10".into(),
            photo_ref: None,
            dispatcher_chat_id: DISPATCHER_CHAT,
        }
    }

    #[test]
    fn validation_rejects_missing_deadline() {
        let mut c = candidate();
        c.deadline = None;
        let err = validate_confirmation(&sample_registry(), &confirm(c)).unwrap_err();
        assert!(matches!(err, OrderError::MissingDeadline));
        assert!(err.is_validation());
    }

    #[test]
    fn validation_rejects_missing_or_zero_quantity() {
        let registry = sample_registry();
        for quantity in [None, Some(0)] {
            let mut c = candidate();
            c.quantity = quantity;
            assert!(matches!(
                validate_confirmation(&registry, &confirm(c)),
                Err(OrderError::InvalidQuantity)
            ));
        }
    }

    #[test]
    fn validation_rejects_blank_work_type() {
        let mut c = candidate();
        c.work_type = "  ".into();
        assert!(matches!(
            validate_confirmation(&sample_registry(), &confirm(c)),
            Err(OrderError::MissingWorkType)
        ));
    }

    #[test]
    fn validation_rejects_unknown_reference() {
        let mut c = candidate();
        c.technician_id = Some(99);
        let err = validate_confirmation(&sample_registry(), &confirm(c)).unwrap_err();
        assert!(matches!(
            err,
            OrderError::UnknownReference { kind: RegistryKind::Technician, id: 99 }
        ));
    }

    #[test]
    fn invalid_confirmation_never_touches_store() {
        let conn = open_memory_database().unwrap();
        let transport = RecordingTransport::new();
        let mut c = candidate();
        c.deadline = None;

        let result = create_order(&conn, &sample_registry(), &transport, &confirm(c), now());
        assert!(result.is_err());
        assert_eq!(repository::count_orders(&conn).unwrap(), 0);
        assert!(transport.attempts().is_empty());
    }

    #[test]
    fn creates_order_then_notifies() {
        let conn = open_memory_database().unwrap();
        repository::insert_user(&conn, TECH_CHAT, "Мороков", UserRole::Technician, Some(1)).unwrap();
        let transport = RecordingTransport::new();

        let created =
            create_order(&conn, &sample_registry(), &transport, &confirm(candidate()), now()).unwrap();

        assert_eq!(created.order.status, OrderStatus::InProgress);
        assert_eq!(created.order.quantity, 2);
        assert_eq!(created.order.created_at, now());
        assert!(created.order.description.starts_with("Мороков"));
        assert_eq!(repository::count_orders(&conn).unwrap(), 1);

        assert!(created.notifications.delivered(RecipientRole::Technician));
        assert_eq!(
            created.notifications.outcome(RecipientRole::Doctor).unwrap().status,
            DeliveryStatus::Skipped(SkipReason::NoActiveBinding)
        );
        assert!(created.notifications.delivered(RecipientRole::Dispatcher));
    }

    #[test]
    fn returned_order_matches_stored_row() {
        let conn = open_memory_database().unwrap();
        let transport = RecordingTransport::new();
        let mut c = confirm(candidate());
        c.photo_ref = Some("AgACAgIAAxk".into());
        let with_millis = now() + chrono::Duration::milliseconds(750);

        let created = create_order(&conn, &sample_registry(), &transport, &c, with_millis).unwrap();

        let stored = repository::get_order(&conn, created.order.id).unwrap().unwrap();
        assert_eq!(created.order, stored);
        assert_eq!(created.order.created_at, now());
    }

    #[test]
    fn unreadable_row_after_insert_still_notifies() {
        let conn = open_memory_database().unwrap();
        repository::insert_user(&conn, TECH_CHAT, "Мороков", UserRole::Technician, Some(1)).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER garble_created_at AFTER INSERT ON orders BEGIN
                 UPDATE orders SET created_at = 'garbage' WHERE id = NEW.id;
             END;",
        )
        .unwrap();
        let transport = RecordingTransport::new();

        let created =
            create_order(&conn, &sample_registry(), &transport, &confirm(candidate()), now()).unwrap();

        assert_eq!(repository::count_orders(&conn).unwrap(), 1);
        assert!(created.notifications.delivered(RecipientRole::Technician));
        assert!(created.notifications.delivered(RecipientRole::Dispatcher));
        assert!(matches!(
            repository::get_order(&conn, created.order.id),
            Err(DatabaseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn storage_failure_sends_nothing() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch("DROP TABLE reminders; DROP TABLE orders;").unwrap();
        let transport = RecordingTransport::new();

        let err = create_order(&conn, &sample_registry(), &transport, &confirm(candidate()), now())
            .unwrap_err();
        assert!(matches!(err, OrderError::Storage(_)));
        assert!(!err.is_validation());
        assert!(transport.attempts().is_empty());
    }

    #[test]
    fn delivery_failure_still_reports_created_order() {
        let conn = open_memory_database().unwrap();
        repository::insert_user(&conn, TECH_CHAT, "Мороков", UserRole::Technician, Some(1)).unwrap();
        let transport = RecordingTransport::new().fail_for(TECH_CHAT);

        let created =
            create_order(&conn, &sample_registry(), &transport, &confirm(candidate()), now()).unwrap();
        assert_eq!(created.notifications.failures(), 1);
        assert!(created.notifications.delivered(RecipientRole::Dispatcher));
        assert!(repository::get_order(&conn, created.order.id).unwrap().is_some());
    }

    #[test]
    fn scenario_order_text_to_notifications() {
        let registry = sample_registry();
        let client = MockExtractionClient::new(
            r#"{"technician_name": "Мороков", "doctor_name": null, "patient_name": "Иванов",
                "work_type": "циркон на винте", "quantity": 7, "deadline": null, "notes": null}"#,
        );
        let conn = open_memory_database().unwrap();
        repository::insert_user(&conn, TECH_CHAT, "Мороков", UserRole::Technician, Some(1)).unwrap();
        let transport = RecordingTransport::new();

        let text = "Мороков циркон на винте 7шт пациент Иванов";
        let mut candidate = IntakeNormalizer::new(&client, &registry).normalize(text).unwrap();
        assert_eq!(candidate.technician_id, Some(1));
        assert_eq!(candidate.work_type, "Циркон на винте");
        assert_eq!(candidate.quantity, Some(7));
        assert_eq!(candidate.deadline, None);
        assert_eq!(candidate.patient_name.as_deref(), Some("Иванов"));
        assert_eq!(candidate.doctor_id, None);

        // The dispatcher fills in the deadline while confirming.
        candidate.deadline = NaiveDate::from_ymd_opt(2026, 10, 20);
        let created = create_order(
            &conn,
            &registry,
            &transport,
            &ConfirmOrder {
                candidate,
                raw_text: text.into(),
                photo_ref: None,
                dispatcher_chat_id: DISPATCHER_CHAT,
            },
            now(),
        )
        .unwrap();

        assert!(created.notifications.delivered(RecipientRole::Technician));
        assert_eq!(
            created.notifications.outcome(RecipientRole::Doctor).unwrap().status,
            DeliveryStatus::Skipped(SkipReason::NoReference)
        );
        assert!(created.notifications.delivered(RecipientRole::Dispatcher));
        assert_eq!(transport.attempts_to(TECH_CHAT).len(), 1);
        assert_eq!(transport.attempts_to(DISPATCHER_CHAT).len(), 1);
    }

    #[test]
    fn scenario_invalid_extraction_creates_nothing() {
        let registry = sample_registry();
        let client = MockExtractionClient::new("Извините, я не понял заказ");
        let conn = open_memory_database().unwrap();

        let err = IntakeNormalizer::new(&client, &registry)
            .normalize("что-то непонятное")
            .unwrap_err();
        assert!(matches!(err, IntakeError::NormalizationFailed(_)));
        assert!(!RESEND_PROMPT.is_empty());
        assert_eq!(repository::count_orders(&conn).unwrap(), 0);
    }
}
