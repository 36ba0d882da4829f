//! Модели представления сеток: группировка ячеек по колонкам и фильтрация.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::resources::{ResourceColumn, DAY_KEYS, DAY_LABELS, OVERVIEW_GROUPS, WEEK_TRACKS};
use super::store::{SlotKey, SlotStore, StatusCounts};
use crate::models::{BookingEvent, EventStatus};

/// Фильтр по статусу и по строке поиска (без учёта регистра).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardFilter {
    pub status: Option<EventStatus>,
    pub query: Option<String>,
}

impl BoardFilter {
    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn status_matches(&self, event: &BookingEvent) -> bool {
        self.status.map_or(true, |s| s == event.status)
    }

    /// Обзор ищет по названию, клиентам и тренеру.
    pub fn matches_overview(&self, event: &BookingEvent) -> bool {
        if !self.status_matches(event) {
            return false;
        }
        let Some(needle) = self.needle() else { return true };
        contains(&event.title, &needle)
            || event.clients.iter().any(|c| contains(c, &needle))
            || event.coach.as_deref().is_some_and(|c| contains(c, &needle))
    }

    /// Недельное расписание ищет по названию, тренеру и заметке.
    pub fn matches_week(&self, event: &BookingEvent) -> bool {
        if !self.status_matches(event) {
            return false;
        }
        let Some(needle) = self.needle() else { return true };
        contains(&event.title, &needle)
            || event.coach.as_deref().is_some_and(|c| contains(c, &needle))
            || event.note.as_deref().is_some_and(|n| contains(n, &needle))
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[derive(Debug, Clone, Serialize)]
pub struct CellView {
    pub slot: SlotKey,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<BookingEvent>,
    pub span: usize,
    /// Ячейка занята продолжением записи, начавшейся выше.
    pub continues: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub key: String,
    pub label: String,
    pub capacity_label: String,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub date: NaiveDate,
    pub time_slots: Vec<String>,
    pub groups: Vec<GroupView>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub time_slots: Vec<String>,
    pub days: Vec<GroupView>,
    pub counts: StatusCounts,
}

fn column_view(
    store: &SlotStore,
    group: &str,
    column: &ResourceColumn,
    keep: &dyn Fn(&BookingEvent) -> bool,
) -> ColumnView {
    let grid = store.grid();
    let visible: Vec<_> = store
        .column_events(group, column.key)
        .filter(|(_, e)| keep(e))
        .filter_map(|(k, e)| {
            let start = grid.index_of(&k.time)?;
            let span = grid.span(&e.time, e.end_time.as_deref());
            Some((start, start + span - 1, e))
        })
        .collect();

    let cells = grid
        .labels()
        .iter()
        .enumerate()
        .map(|(index, time)| {
            let slot = SlotKey::new(group, column.key, time);
            match visible.iter().find(|(start, _, _)| *start == index) {
                Some((start, end, event)) => CellView {
                    slot,
                    time: time.clone(),
                    event: Some((*event).clone()),
                    span: end - start + 1,
                    continues: false,
                },
                None => CellView {
                    slot,
                    time: time.clone(),
                    event: None,
                    span: 1,
                    continues: visible.iter().any(|(s, e, _)| index > *s && index <= *e),
                },
            }
        })
        .collect();

    ColumnView {
        key: column.key.to_string(),
        label: column.label.to_string(),
        capacity_label: column.capacity_label.to_string(),
        cells,
    }
}

pub fn overview(store: &SlotStore, date: NaiveDate, filter: &BoardFilter) -> OverviewView {
    let keep = |e: &BookingEvent| filter.matches_overview(e);
    let groups = OVERVIEW_GROUPS
        .iter()
        .map(|group| GroupView {
            key: group.key.to_string(),
            label: group.label.to_string(),
            date: None,
            columns: group
                .columns
                .iter()
                .map(|column| column_view(store, group.key, column, &keep))
                .collect(),
        })
        .collect();

    OverviewView {
        date,
        time_slots: store.grid().labels().to_vec(),
        groups,
        counts: store.status_counts(),
    }
}

pub fn week(store: &SlotStore, week_start: NaiveDate, filter: &BoardFilter) -> WeekView {
    let keep = |e: &BookingEvent| filter.matches_week(e);
    let days = DAY_KEYS
        .iter()
        .zip(DAY_LABELS.iter())
        .enumerate()
        .map(|(index, (key, label))| GroupView {
            key: key.to_string(),
            label: label.to_string(),
            date: Some(week_start + Duration::days(index as i64)),
            columns: WEEK_TRACKS
                .iter()
                .map(|track| column_view(store, key, track, &keep))
                .collect(),
        })
        .collect();

    WeekView {
        week_start,
        time_slots: store.grid().labels().to_vec(),
        days,
        counts: store.status_counts(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::store::tests::{event, key};
    use crate::grid::TimeGrid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()
    }

    fn store() -> SlotStore {
        let mut store = SlotStore::new(TimeGrid::default());
        store.insert(
            key("cowork", "capsule-1", "09:00"),
            event("a", "09:00", Some("11:00"), EventStatus::Paid),
        );
        let mut other = event("b", "13:00", None, EventStatus::Reserved);
        other.coach = Some("Нигина".into());
        other.clients = vec!["Ольга С.".into()];
        store.insert(key("cowork", "capsule-1", "13:00"), other);
        store
    }

    fn cells<'a>(view: &'a OverviewView, group: &str, column: &str) -> &'a [CellView] {
        &view
            .groups
            .iter()
            .find(|g| g.key == group)
            .unwrap()
            .columns
            .iter()
            .find(|c| c.key == column)
            .unwrap()
            .cells
    }

    #[test]
    fn overview_marks_continuation_cells() {
        let view = overview(&store(), date(), &BoardFilter::default());
        assert_eq!(view.groups.len(), 3);
        assert_eq!(view.time_slots.len(), 16);
        let cells = cells(&view, "cowork", "capsule-1");
        assert_eq!(cells.len(), 16);
        assert_eq!(cells[2].event.as_ref().unwrap().id, "a");
        assert_eq!(cells[2].span, 3);
        assert!(cells[3].continues && cells[4].continues);
        assert!(!cells[5].continues && cells[5].event.is_none());
        assert_eq!(view.counts, StatusCounts { reserved: 1, paid: 1, free: 0 });
    }

    #[test]
    fn filters_hide_events_but_keep_counts() {
        let filter = BoardFilter {
            status: None,
            query: Some("ольга".into()),
        };
        let view = overview(&store(), date(), &filter);
        let cells = cells(&view, "cowork", "capsule-1");
        assert!(cells[2].event.is_none());
        assert!(!cells[3].continues);
        assert_eq!(cells[6].event.as_ref().unwrap().id, "b");
        assert_eq!(view.counts.paid, 1);

        let by_status = BoardFilter {
            status: Some(EventStatus::Paid),
            query: None,
        };
        let view = overview(&store(), date(), &by_status);
        assert!(cells_of(&view)[6].event.is_none());
    }

    fn cells_of(view: &OverviewView) -> &[CellView] {
        cells(view, "cowork", "capsule-1")
    }

    #[test]
    fn week_search_covers_notes() {
        let mut e = event("w", "09:00", None, EventStatus::Paid);
        e.note = Some("Нужен коврик".into());
        assert!(BoardFilter { status: None, query: Some("коврик".into()) }.matches_week(&e));
        assert!(!BoardFilter { status: None, query: Some("коврик".into()) }.matches_overview(&e));
    }

    #[test]
    fn week_view_has_seven_dated_days() {
        let mut store = SlotStore::new(TimeGrid::default());
        store.insert(key("friday", "body", "19:00"), event("y", "19:00", None, EventStatus::Paid));
        let view = week(&store, date(), &BoardFilter::default());
        assert_eq!(view.days.len(), 7);
        let friday = &view.days[4];
        assert_eq!(friday.key, "friday");
        assert_eq!(friday.date, NaiveDate::from_ymd_opt(2025, 12, 19));
        assert_eq!(friday.columns.len(), 2);
        assert_eq!(friday.columns[0].cells[12].event.as_ref().unwrap().id, "y");
    }
}
