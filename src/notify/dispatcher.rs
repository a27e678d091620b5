use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository;
use crate::models::UserRole;

use super::messages::{self, OrderNotice};
use super::transport::MessageTransport;

/// Longest photo caption the messaging API accepts, in UTF-16 units.
pub const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Technician,
    Doctor,
    Dispatcher,
}

impl RecipientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technician => "technician",
            Self::Doctor => "doctor",
            Self::Dispatcher => "dispatcher",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The order carries no resolved reference for this role.
    NoReference,
    /// The reference has no active user binding.
    NoActiveBinding,
    /// The binding lookup itself failed.
    LookupFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientOutcome {
    pub role: RecipientRole,
    pub chat_id: Option<i64>,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl RecipientOutcome {
    pub fn was_attempted(&self) -> bool {
        matches!(
            self.status,
            DeliveryStatus::Delivered | DeliveryStatus::Failed(_)
        )
    }
}

/// Per-recipient result of one order-created fan-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchReport {
    pub fn outcome(&self, role: RecipientRole) -> Option<&RecipientOutcome> {
        self.outcomes.iter().find(|o| o.role == role)
    }

    pub fn delivered(&self, role: RecipientRole) -> bool {
        matches!(
            self.outcome(role).map(|o| &o.status),
            Some(DeliveryStatus::Delivered)
        )
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Failed(_)))
            .count()
    }
}

/// Best-effort delivery: one attempt per recipient, failures are
/// reported and logged but never propagated.
pub struct NotificationDispatcher<'a> {
    transport: &'a dyn MessageTransport,
}

impl<'a> NotificationDispatcher<'a> {
    pub fn new(transport: &'a dyn MessageTransport) -> Self {
        Self { transport }
    }

    /// Notify the bound technician, the bound doctor and the originating
    /// dispatcher about a freshly stored order, in that order.
    pub fn notify_order_created(
        &self,
        conn: &Connection,
        notice: &OrderNotice,
        dispatcher_chat_id: i64,
    ) -> DispatchReport {
        let order = notice.order;
        let mut report = DispatchReport::default();

        let technician = self.notify_bound(
            conn,
            RecipientRole::Technician,
            UserRole::Technician,
            order.technician_id,
            order.id,
            order.photo_id.as_deref(),
            &messages::technician_assignment(notice),
        );
        report.outcomes.push(technician);

        let doctor = self.notify_bound(
            conn,
            RecipientRole::Doctor,
            UserRole::Doctor,
            order.doctor_id,
            order.id,
            order.photo_id.as_deref(),
            &messages::doctor_assignment(notice),
        );
        report.outcomes.push(doctor);

        let attempted: Vec<RecipientRole> = report
            .outcomes
            .iter()
            .filter(|o| o.was_attempted())
            .map(|o| o.role)
            .collect();
        let text = messages::dispatcher_confirmation(notice, &attempted);
        let status = self.deliver(
            RecipientRole::Dispatcher,
            dispatcher_chat_id,
            order.photo_id.as_deref(),
            &text,
        );
        report.outcomes.push(RecipientOutcome {
            role: RecipientRole::Dispatcher,
            chat_id: Some(dispatcher_chat_id),
            status,
        });

        tracing::info!(
            order_id = order.id,
            failures = report.failures(),
            "Order notifications dispatched"
        );
        report
    }

    /// Look up the active binding for a resolved reference and deliver
    /// one message to it.
    #[allow(clippy::too_many_arguments)]
    pub fn notify_bound(
        &self,
        conn: &Connection,
        recipient: RecipientRole,
        role: UserRole,
        reference_id: Option<i64>,
        order_id: i64,
        photo: Option<&str>,
        text: &str,
    ) -> RecipientOutcome {
        let skipped = |reason: SkipReason| RecipientOutcome {
            role: recipient,
            chat_id: None,
            status: DeliveryStatus::Skipped(reason),
        };

        let Some(reference_id) = reference_id else {
            tracing::debug!(order_id, role = recipient.as_str(), "No reference, skipping");
            return skipped(SkipReason::NoReference);
        };

        let binding = match repository::find_active_user(conn, role, reference_id) {
            Ok(Some(binding)) => binding,
            Ok(None) => {
                tracing::info!(
                    order_id,
                    role = recipient.as_str(),
                    reference_id,
                    "No active binding, skipping"
                );
                return skipped(SkipReason::NoActiveBinding);
            }
            Err(e) => {
                tracing::warn!(
                    order_id,
                    role = recipient.as_str(),
                    error = %e,
                    "Binding lookup failed"
                );
                return skipped(SkipReason::LookupFailed(e.to_string()));
            }
        };

        let status = self.deliver(recipient, binding.external_identity, photo, text);
        RecipientOutcome {
            role: recipient,
            chat_id: Some(binding.external_identity),
            status,
        }
    }

    /// Single attempt: photo with caption when a photo is attached,
    /// plain text otherwise. A text too long for a caption goes out as a
    /// bare photo followed by the full text.
    pub fn deliver(
        &self,
        role: RecipientRole,
        chat_id: i64,
        photo: Option<&str>,
        text: &str,
    ) -> DeliveryStatus {
        let result = match photo {
            Some(photo) if fits_caption(text) => self.transport.send_photo(chat_id, photo, text),
            Some(photo) => {
                let photo_result = self.transport.send_photo(chat_id, photo, "");
                let text_result = self.transport.send_text(chat_id, text);
                photo_result.and(text_result)
            }
            None => self.transport.send_text(chat_id, text),
        };

        match result {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                tracing::warn!(
                    recipient = chat_id,
                    role = role.as_str(),
                    error = %e,
                    "Notification delivery failed"
                );
                DeliveryStatus::Failed(e.to_string())
            }
        }
    }
}

fn fits_caption(text: &str) -> bool {
    text.encode_utf16().count() <= CAPTION_LIMIT
}
