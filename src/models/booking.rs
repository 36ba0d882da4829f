use serde::{Deserialize, Serialize};

pub const CATEGORY_BODY_MIND: &str = "Body Mind";
pub const CATEGORY_PILATES_REFORMER: &str = "Pilates Reformer";
pub const CATEGORY_COWORKING: &str = "Коворкинг";
pub const CATEGORY_KIDS: &str = "Eywa Kids";

/// Статус записи в том виде, в котором его отдаёт CRM API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    #[serde(rename = "Бронь")]
    Booked,
    #[serde(rename = "Оплачено")]
    Paid,
    #[serde(rename = "Свободно")]
    #[default]
    Free,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "Бронь",
            BookingStatus::Paid => "Оплачено",
            BookingStatus::Free => "Свободно",
        }
    }
}

/// Клиент внутри записи (в групповых занятиях их может быть несколько).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleBooking {
    #[serde(alias = "public_id")]
    pub id: String,
    pub booking_date: String,
    pub booking_time: String,
    /// Последний занятый слот (включительно). Нет поля - запись на один слот.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_end_time: Option<String>,
    pub category: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub trainer_name: Option<String>,
    #[serde(default)]
    pub clients: Vec<ClientInfo>,
    #[serde(default = "default_capacity")]
    pub max_capacity: u32,
    #[serde(default)]
    pub current_count: u32,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub capsule_id: Option<String>,
    #[serde(default)]
    pub capsule_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_capacity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleBookingCreate {
    pub booking_date: String,
    pub booking_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_end_time: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_name: Option<String>,
    pub clients: Vec<ClientInfo>,
    pub max_capacity: u32,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule_name: Option<String>,
}

/// PATCH-запрос: отправляются только заполненные поля.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleBookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule_name: Option<String>,
}

impl ScheduleBookingUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Фильтры для GET /api/schedule/bookings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn for_dates(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Self {
        Self {
            start_date: Some(start.format("%Y-%m-%d").to_string()),
            end_date: Some(end.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_accepts_public_id_and_defaults() {
        let raw = r#"{
            "public_id": "b-1",
            "booking_date": "2025-12-15",
            "booking_time": "10:00",
            "category": "Body Mind",
            "status": "Бронь"
        }"#;
        let booking: ScheduleBooking = serde_json::from_str(raw).unwrap();
        assert_eq!(booking.id, "b-1");
        assert_eq!(booking.status, BookingStatus::Booked);
        assert_eq!(booking.max_capacity, 1);
        assert_eq!(booking.current_count, 0);
        assert!(booking.clients.is_empty());
        assert!(booking.booking_end_time.is_none());
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let update = ScheduleBookingUpdate {
            status: Some(BookingStatus::Paid),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "Оплачено" }));
        assert!(ScheduleBookingUpdate::default().is_empty());
    }

    #[test]
    fn filter_encodes_as_query() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let filter = BookingFilter::for_dates(date, date).with_category(CATEGORY_KIDS);
        let query = serde_urlencoded::to_string(&filter).unwrap();
        assert_eq!(
            query,
            "start_date=2025-12-15&end_date=2025-12-15&category=Eywa+Kids"
        );
    }
}
