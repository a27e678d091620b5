//! Russian message templates for order and reminder notifications.

use crate::models::Order;
use crate::pipeline::intake::DISPLAY_DATE_FORMAT;

use super::dispatcher::RecipientRole;

const UNSPECIFIED: &str = "Не указан";

/// An order together with the display names used in its messages.
#[derive(Debug, Clone, Copy)]
pub struct OrderNotice<'a> {
    pub order: &'a Order,
    pub technician_name: Option<&'a str>,
    pub doctor_name: Option<&'a str>,
}

fn or_unspecified(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(UNSPECIFIED)
}

fn deadline(order: &Order) -> String {
    order.deadline.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn technician_assignment(notice: &OrderNotice) -> String {
    let order = notice.order;
    format!(
        "🔧 Вам назначена новая работа (заказ №{id})\n\n\
         👤 Пациент: {patient}\n\
         👨‍⚕️ Врач: {doctor}\n\
         🔨 Вид работы: {work}\n\
         📊 Количество: {qty} шт\n\
         📅 Срок выполнения: {deadline}\n\n\
         📝 Заказ: {description}",
        id = order.id,
        patient = or_unspecified(order.patient_name.as_deref()),
        doctor = or_unspecified(notice.doctor_name),
        work = order.work_type,
        qty = order.quantity,
        deadline = deadline(order),
        description = order.description,
    )
}

pub fn doctor_assignment(notice: &OrderNotice) -> String {
    let order = notice.order;
    format!(
        "📋 Ваш заказ №{id} принят в работу\n\n\
         👤 Пациент: {patient}\n\
         🔧 Техник: {technician}\n\
         🔨 Вид работы: {work}\n\
         📊 Количество: {qty} шт\n\
         📅 Срок выполнения: {deadline}",
        id = order.id,
        patient = or_unspecified(order.patient_name.as_deref()),
        technician = or_unspecified(notice.technician_name),
        work = order.work_type,
        qty = order.quantity,
        deadline = deadline(order),
    )
}

/// Confirmation for the dispatcher. `attempted` lists the recipients a
/// delivery was attempted for before this message.
pub fn dispatcher_confirmation(notice: &OrderNotice, attempted: &[RecipientRole]) -> String {
    let order = notice.order;
    let notified = if attempted.is_empty() {
        "📤 Уведомления не отправлялись".to_string()
    } else {
        let names: Vec<&str> = attempted
            .iter()
            .map(|role| match role {
                RecipientRole::Technician => "технику",
                RecipientRole::Doctor => "врачу",
                RecipientRole::Dispatcher => "диспетчеру",
            })
            .collect();
        format!("📤 Уведомления отправлены: {}", names.join(", "))
    };

    format!(
        "✅ Заказ №{id} создан\n\n\
         🔧 Техник: {technician}\n\
         👨‍⚕️ Врач: {doctor}\n\
         👤 Пациент: {patient}\n\
         🔨 Вид работы: {work}\n\
         📊 Количество: {qty} шт\n\
         📅 Срок выполнения: {deadline}\n\n\
         {notified}",
        id = order.id,
        technician = or_unspecified(notice.technician_name),
        doctor = or_unspecified(notice.doctor_name),
        patient = or_unspecified(order.patient_name.as_deref()),
        work = order.work_type,
        qty = order.quantity,
        deadline = deadline(order),
    )
}

pub fn technician_reminder(order: &Order) -> String {
    format!(
        "⏰ Напоминание: завтра срок сдачи заказа №{id}\n\n\
         👤 Пациент: {patient}\n\
         🔨 Вид работы: {work}\n\
         📊 Количество: {qty} шт\n\
         📅 Срок: {deadline}",
        id = order.id,
        patient = or_unspecified(order.patient_name.as_deref()),
        work = order.work_type,
        qty = order.quantity,
        deadline = deadline(order),
    )
}

pub fn dispatcher_reminder(order: &Order, technician_name: Option<&str>) -> String {
    format!(
        "⏰ Завтра срок сдачи заказа №{id}\n\n\
         🔧 Техник: {technician}\n\
         👤 Пациент: {patient}\n\
         🔨 Вид работы: {work}\n\
         📅 Срок: {deadline}",
        id = order.id,
        technician = or_unspecified(technician_name),
        patient = or_unspecified(order.patient_name.as_deref()),
        work = order.work_type,
        deadline = deadline(order),
    )
}
