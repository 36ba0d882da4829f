use serde::{Deserialize, Serialize};

use crate::grid::normalize_label;
use crate::models::booking::{BookingStatus, ScheduleBooking};

/// Статус карточки на сетке.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Reserved,
    Paid,
    Free,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [EventStatus::Reserved, EventStatus::Paid, EventStatus::Free];

    pub fn color(&self) -> &'static str {
        match self {
            EventStatus::Reserved => "#F59E0B",
            EventStatus::Paid => "#16A34A",
            EventStatus::Free => "#10B981",
        }
    }

    pub fn label(&self) -> &'static str {
        BookingStatus::from(*self).as_str()
    }
}

impl From<BookingStatus> for EventStatus {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Booked => EventStatus::Reserved,
            BookingStatus::Paid => EventStatus::Paid,
            BookingStatus::Free => EventStatus::Free,
        }
    }
}

impl From<EventStatus> for BookingStatus {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Reserved => BookingStatus::Booked,
            EventStatus::Paid => BookingStatus::Paid,
            EventStatus::Free => BookingStatus::Free,
        }
    }
}

/// Запись, занимающая одну или несколько ячеек сетки.
///
/// `time` и `end_time` - метки слотов, диапазон включительный.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingEvent {
    pub id: String,
    pub title: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub status: EventStatus,
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BookingEvent {
    pub fn from_booking(booking: &ScheduleBooking) -> Self {
        let status = EventStatus::from(booking.status);
        let clients: Vec<String> = booking
            .clients
            .iter()
            .map(|c| c.client_name.clone())
            .collect();

        let title = booking
            .service_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| clients.first().cloned())
            .or_else(|| booking.capsule_name.clone())
            .unwrap_or_else(|| booking.category.clone());

        let time = normalize_label(&booking.booking_time).unwrap_or_else(|| booking.booking_time.clone());
        let end_time = booking
            .booking_end_time
            .as_deref()
            .map(|t| normalize_label(t).unwrap_or_else(|| t.to_string()));

        Self {
            id: booking.id.clone(),
            title,
            time,
            end_time,
            status,
            color: status.color().to_string(),
            phone: booking.clients.iter().find_map(|c| c.client_phone.clone()),
            clients,
            coach: booking.trainer_name.clone(),
            capacity: Some(booking.max_capacity),
            people_count: Some(booking.current_count),
            note: booking.notes.clone(),
        }
    }

    /// В недельном расписании цвет определяется типом занятия, а не статусом.
    pub fn with_class_color(mut self) -> Self {
        if let Some(color) = class_color(&class_code(&self.title)) {
            self.color = color.to_string();
        }
        self
    }
}

pub fn class_code(title: &str) -> String {
    let normalized = title.trim().to_uppercase();
    if normalized.starts_with("STRETCH") {
        "Stretching".to_string()
    } else if normalized.starts_with("PIL") {
        "PILATES".to_string()
    } else if normalized.starts_with("REF") {
        "REFORMER".to_string()
    } else if normalized.starts_with("YOG") {
        "YOGA".to_string()
    } else {
        title.trim().to_string()
    }
}

pub fn class_color(code: &str) -> Option<&'static str> {
    match code {
        "Stretching" => Some("#79A7D3"),
        "PILATES" => Some("#C7B7A3"),
        "REFORMER" => Some("#C86B58"),
        "YOGA" => Some("#4E8A64"),
        _ => None,
    }
}
