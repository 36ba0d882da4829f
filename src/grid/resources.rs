//! Статическая иерархия ресурсов: группы и колонки обеих сеток.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::booking::{
    ScheduleBooking, CATEGORY_BODY_MIND, CATEGORY_COWORKING, CATEGORY_KIDS, CATEGORY_PILATES_REFORMER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub capacity_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGroup {
    pub key: &'static str,
    pub label: &'static str,
    pub columns: &'static [ResourceColumn],
}

pub const COWORK_GROUP: &str = "cowork";
pub const BODYMIND_GROUP: &str = "bodymind";
pub const KIDS_GROUP: &str = "kids";

pub const BODY_TRACK: &str = "body";
pub const REFORM_TRACK: &str = "reform";

pub static OVERVIEW_GROUPS: &[ResourceGroup] = &[
    ResourceGroup {
        key: COWORK_GROUP,
        label: "Коворкинг",
        columns: &[
            ResourceColumn { key: "capsule-1", label: "Капсула 1", capacity_label: "4 места" },
            ResourceColumn { key: "capsule-2", label: "Капсула 2", capacity_label: "6 мест" },
            ResourceColumn { key: "capsule-3", label: "Капсула 3", capacity_label: "1 место" },
            ResourceColumn { key: "capsule-4", label: "Капсула 4", capacity_label: "1 место" },
            ResourceColumn { key: "capsule-5", label: "Капсула 5", capacity_label: "1 место" },
            ResourceColumn { key: "ivent-zone", label: "ИвентЗона", capacity_label: "20 мест" },
        ],
    },
    ResourceGroup {
        key: BODYMIND_GROUP,
        label: "Body & Mind",
        columns: &[
            ResourceColumn { key: BODY_TRACK, label: "Body", capacity_label: "10 мест" },
            ResourceColumn { key: REFORM_TRACK, label: "Reform", capacity_label: "4 места" },
        ],
    },
    ResourceGroup {
        key: KIDS_GROUP,
        label: "Eywa Kids",
        columns: &[ResourceColumn { key: "kids", label: "Kids", capacity_label: "10 мест" }],
    },
];

pub static WEEK_TRACKS: &[ResourceColumn] = &[
    ResourceColumn { key: BODY_TRACK, label: "BODY", capacity_label: "" },
    ResourceColumn { key: REFORM_TRACK, label: "REFORM", capacity_label: "" },
];

pub const DAY_KEYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];
pub const DAY_LABELS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

pub fn overview_group(key: &str) -> Option<&'static ResourceGroup> {
    OVERVIEW_GROUPS.iter().find(|g| g.key == key)
}

pub fn overview_column(group: &str, column: &str) -> Option<&'static ResourceColumn> {
    overview_group(group)?.columns.iter().find(|c| c.key == column)
}

pub fn week_track(key: &str) -> Option<&'static ResourceColumn> {
    WEEK_TRACKS.iter().find(|t| t.key == key)
}

pub fn is_day_key(key: &str) -> bool {
    DAY_KEYS.contains(&key)
}

/// Категория API для колонки обзора.
pub fn category_for(group: &str, column: &str) -> Option<&'static str> {
    match (group, column) {
        (COWORK_GROUP, _) => overview_column(group, column).map(|_| CATEGORY_COWORKING),
        (BODYMIND_GROUP, BODY_TRACK) => Some(CATEGORY_BODY_MIND),
        (BODYMIND_GROUP, REFORM_TRACK) => Some(CATEGORY_PILATES_REFORMER),
        (KIDS_GROUP, "kids") => Some(CATEGORY_KIDS),
        _ => None,
    }
}

/// Категория API для дорожки недельного расписания.
pub fn track_category(track: &str) -> Option<&'static str> {
    match track {
        BODY_TRACK => Some(CATEGORY_BODY_MIND),
        REFORM_TRACK => Some(CATEGORY_PILATES_REFORMER),
        _ => None,
    }
}

pub fn track_for_category(category: &str) -> Option<&'static str> {
    match category {
        CATEGORY_BODY_MIND => Some(BODY_TRACK),
        CATEGORY_PILATES_REFORMER => Some(REFORM_TRACK),
        _ => None,
    }
}

/// Группа и колонка обзора для записи из API.
/// Для коворкинга колонка ищется по `capsule_id`, затем по названию капсулы.
pub fn overview_cell_for(booking: &ScheduleBooking) -> Option<(&'static str, &'static str)> {
    match booking.category.as_str() {
        CATEGORY_COWORKING => {
            let group = overview_group(COWORK_GROUP)?;
            let by_id = booking
                .capsule_id
                .as_deref()
                .and_then(|id| group.columns.iter().find(|c| c.key == id));
            let column = by_id.or_else(|| {
                let name = booking.capsule_name.as_deref()?.trim();
                group
                    .columns
                    .iter()
                    .find(|c| c.label.to_lowercase() == name.to_lowercase())
            })?;
            Some((group.key, column.key))
        }
        CATEGORY_BODY_MIND => Some((BODYMIND_GROUP, BODY_TRACK)),
        CATEGORY_PILATES_REFORMER => Some((BODYMIND_GROUP, REFORM_TRACK)),
        CATEGORY_KIDS => Some((KIDS_GROUP, "kids")),
        _ => None,
    }
}

/// Понедельник недели, содержащей `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn day_key(date: NaiveDate) -> &'static str {
    DAY_KEYS[date.weekday().num_days_from_monday() as usize]
}

pub fn date_for_day_key(week_start: NaiveDate, key: &str) -> Option<NaiveDate> {
    let index = DAY_KEYS.iter().position(|d| *d == key)?;
    Some(week_start + Duration::days(index as i64))
}
