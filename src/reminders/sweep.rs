use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::{Order, ReminderType, UserBinding, UserRole};
use crate::notify::{messages, DeliveryStatus, MessageTransport, NotificationDispatcher, RecipientRole};
use crate::registry::{Registry, RegistryKind};

use super::window::{ReminderWindow, WindowDecision};

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("No calendar day follows {0}")]
    DateOverflow(NaiveDate),
}

/// Counts for one sweep, tagged with the id used in its log lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub sweep_id: Uuid,
    pub due_date: NaiveDate,
    pub orders: usize,
    pub technician_reminders: usize,
    pub dispatcher_reminders: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Idle,
    AlreadySwept,
    /// Past the grace window; the day was marked swept without sending.
    SkippedLate,
    Swept(SweepSummary),
}

/// One scheduler tick: evaluate the window against the persisted
/// last-swept day and sweep when due. The day is marked only after the
/// sweep finishes, so a failed sweep is retried on the next tick.
pub fn run_tick(
    conn: &Connection,
    registry: &Registry,
    transport: &dyn MessageTransport,
    window: &ReminderWindow,
    now: NaiveDateTime,
) -> Result<TickOutcome, SweepError> {
    let today = now.date();
    let last_swept = repository::get_last_sweep_date(conn)?;

    match window.check(now, last_swept) {
        WindowDecision::Idle => Ok(TickOutcome::Idle),
        WindowDecision::AlreadySwept => Ok(TickOutcome::AlreadySwept),
        WindowDecision::TooLate => {
            tracing::warn!(
                date = %today,
                at = %window.at,
                "Reminder window missed, skipping today's sweep"
            );
            repository::set_last_sweep_date(conn, today)?;
            Ok(TickOutcome::SkippedLate)
        }
        WindowDecision::Sweep => {
            let summary = run_sweep(conn, registry, transport, now)?;
            repository::set_last_sweep_date(conn, today)?;
            Ok(TickOutcome::Swept(summary))
        }
    }
}

/// Remind about every in-progress order due tomorrow that has no ledger
/// row yet. Each order is claimed in the ledger before delivery, so it
/// is processed at most once even if deliveries fail.
pub fn run_sweep(
    conn: &Connection,
    registry: &Registry,
    transport: &dyn MessageTransport,
    now: NaiveDateTime,
) -> Result<SweepSummary, SweepError> {
    let today = now.date();
    let due_date = today.succ_opt().ok_or(SweepError::DateOverflow(today))?;
    let sweep_id = Uuid::new_v4();

    let orders = repository::orders_due_without_reminder(conn, due_date, ReminderType::DueTomorrow)?;
    let dispatchers = repository::active_users_with_role(conn, UserRole::Dispatcher)?;

    tracing::info!(
        %sweep_id,
        due_date = %due_date,
        orders = orders.len(),
        dispatchers = dispatchers.len(),
        "Reminder sweep started"
    );

    let notifier = NotificationDispatcher::new(transport);
    let mut summary = SweepSummary {
        sweep_id,
        due_date,
        orders: 0,
        technician_reminders: 0,
        dispatcher_reminders: 0,
        failures: 0,
    };

    for order in &orders {
        if !repository::claim_reminder(conn, order.id, ReminderType::DueTomorrow, now)? {
            tracing::debug!(%sweep_id, order_id = order.id, "Reminder already claimed");
            continue;
        }
        summary.orders += 1;
        remind_order(&notifier, conn, registry, order, &dispatchers, &mut summary);
    }

    tracing::info!(
        %sweep_id,
        orders = summary.orders,
        technician_reminders = summary.technician_reminders,
        dispatcher_reminders = summary.dispatcher_reminders,
        failures = summary.failures,
        "Reminder sweep finished"
    );
    Ok(summary)
}

fn remind_order(
    notifier: &NotificationDispatcher,
    conn: &Connection,
    registry: &Registry,
    order: &Order,
    dispatchers: &[UserBinding],
    summary: &mut SweepSummary,
) {
    let technician = notifier.notify_bound(
        conn,
        RecipientRole::Technician,
        UserRole::Technician,
        order.technician_id,
        order.id,
        None,
        &messages::technician_reminder(order),
    );
    match technician.status {
        DeliveryStatus::Delivered => summary.technician_reminders += 1,
        DeliveryStatus::Failed(_) => summary.failures += 1,
        DeliveryStatus::Skipped(_) => {}
    }

    let technician_name = order
        .technician_id
        .and_then(|id| registry.name_of(RegistryKind::Technician, id));
    let text = messages::dispatcher_reminder(order, technician_name);

    for dispatcher in dispatchers {
        match notifier.deliver(
            RecipientRole::Dispatcher,
            dispatcher.external_identity,
            None,
            &text,
        ) {
            DeliveryStatus::Delivered => summary.dispatcher_reminders += 1,
            _ => summary.failures += 1,
        }
    }
}
