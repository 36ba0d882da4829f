use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::resources::{day_key, overview_cell_for, track_for_category};
use super::time_slots::{normalize_label, SlotRange, TimeGrid};
use super::SlotError;
use crate::models::{BookingEvent, EventStatus, ScheduleBooking};

const KEY_SEPARATOR: &str = "__";

/// Ключ ячейки: (группа, колонка, время). В JSON - строка `group__column__time`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotKey {
    pub group: String,
    pub column: String,
    pub time: String,
}

impl SlotKey {
    pub fn new(group: impl Into<String>, column: impl Into<String>, time: &str) -> Self {
        Self {
            group: group.into(),
            column: column.into(),
            time: normalize_label(time).unwrap_or_else(|| time.to_string()),
        }
    }

    pub fn in_column(&self, group: &str, column: &str) -> bool {
        self.group == group && self.column == column
    }

    pub fn with_time(&self, time: &str) -> Self {
        Self::new(self.group.clone(), self.column.clone(), time)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{sep}{}{sep}{}", self.group, self.column, self.time, sep = KEY_SEPARATOR)
    }
}

impl FromStr for SlotKey {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(KEY_SEPARATOR);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(g), Some(c), Some(t), None) if !g.is_empty() && !c.is_empty() && !t.is_empty() => {
                Ok(SlotKey::new(g, c, t))
            }
            _ => Err(SlotError::BadKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for SlotKey {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub reserved: usize,
    pub paid: usize,
    pub free: usize,
}

/// Карта ячеек сетки. Пустые ячейки просто отсутствуют в карте.
#[derive(Debug, Clone)]
pub struct SlotStore {
    grid: TimeGrid,
    slots: BTreeMap<SlotKey, BookingEvent>,
}

impl SlotStore {
    pub fn new(grid: TimeGrid) -> Self {
        Self { grid, slots: BTreeMap::new() }
    }

    /// Раскладывает записи дня по колонкам обзора.
    pub fn from_overview(grid: TimeGrid, bookings: &[ScheduleBooking]) -> Self {
        let mut store = Self::new(grid);
        for booking in bookings {
            let Some((group, column)) = overview_cell_for(booking) else {
                warn!(
                    "Booking {} skipped: no overview column for category {:?}",
                    booking.id, booking.category
                );
                continue;
            };
            store.place(SlotKey::new(group, column, &booking.booking_time), BookingEvent::from_booking(booking));
        }
        store
    }

    /// Раскладывает записи Body Mind / Pilates Reformer по дням недели.
    pub fn from_week(grid: TimeGrid, week_start: NaiveDate, bookings: &[ScheduleBooking]) -> Self {
        let mut store = Self::new(grid);
        let week_end = week_start + chrono::Duration::days(6);
        for booking in bookings {
            let Some(track) = track_for_category(&booking.category) else {
                continue;
            };
            let date = match NaiveDate::parse_from_str(&booking.booking_date, "%Y-%m-%d") {
                Ok(date) if date >= week_start && date <= week_end => date,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Booking {} has invalid date {:?}: {}", booking.id, booking.booking_date, e);
                    continue;
                }
            };
            let key = SlotKey::new(day_key(date), track, &booking.booking_time);
            store.place(key, BookingEvent::from_booking(booking).with_class_color());
        }
        store
    }

    fn place(&mut self, key: SlotKey, event: BookingEvent) {
        if self.grid.index_of(&key.time).is_none() {
            warn!("Booking {} skipped: time {} is outside the grid", event.id, key.time);
            return;
        }
        if let Some(existing) = self.slots.get(&key) {
            warn!("Booking {} skipped: cell {} already holds {}", event.id, key, existing.id);
            return;
        }
        self.slots.insert(key, event);
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn get(&self, key: &SlotKey) -> Option<&BookingEvent> {
        self.slots.get(key)
    }

    pub fn is_occupied(&self, key: &SlotKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn insert(&mut self, key: SlotKey, event: BookingEvent) -> Option<BookingEvent> {
        self.slots.insert(key, event)
    }

    pub fn remove(&mut self, key: &SlotKey) -> Option<BookingEvent> {
        self.slots.remove(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &BookingEvent)> {
        self.slots.iter()
    }

    pub fn column_events<'a, 'b>(
        &'a self,
        group: &'b str,
        column: &'b str,
    ) -> impl Iterator<Item = (&'a SlotKey, &'a BookingEvent)> + 'b
    where
        'a: 'b,
    {
        self.slots.iter().filter(move |(k, _)| k.in_column(group, column))
    }

    pub fn find_by_id(&self, id: &str) -> Option<(&SlotKey, &BookingEvent)> {
        self.slots.iter().find(|(_, e)| e.id == id)
    }

    /// Диапазон записи, начинающейся в ячейке `key`.
    /// `None`, если конец указан, но не найден в сетке.
    pub fn range_at(&self, key: &SlotKey, event: &BookingEvent) -> Option<SlotRange> {
        let start = self.grid.index_of(&key.time)?;
        let end = match event.end_time.as_deref() {
            Some(end) => self.grid.index_of(end)?,
            None => start,
        };
        Some(SlotRange::new(start, end))
    }

    /// Есть ли в колонке другая запись (кроме `skip`), пересекающая `range`.
    pub fn has_conflict(&self, skip: &SlotKey, group: &str, column: &str, range: SlotRange) -> bool {
        self.column_events(group, column)
            .filter(|(key, _)| *key != skip)
            .any(|(key, event)| {
                self.range_at(key, event)
                    .map(|other| other.overlaps(&range))
                    .unwrap_or(false)
            })
    }

    /// Запись, покрывающая ячейку `key` (начинающаяся в ней или раньше).
    pub fn covering(&self, key: &SlotKey) -> Option<(&SlotKey, &BookingEvent)> {
        let index = self.grid.index_of(&key.time)?;
        self.column_events(&key.group, &key.column).find(|(k, e)| {
            self.range_at(k, e).map(|r| r.contains(index)).unwrap_or(false)
        })
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for event in self.slots.values() {
            match event.status {
                EventStatus::Reserved => counts.reserved += 1,
                EventStatus::Paid => counts.paid += 1,
                EventStatus::Free => counts.free += 1,
            }
        }
        counts
    }
}
