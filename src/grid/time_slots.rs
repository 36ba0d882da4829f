use serde::Serialize;

use crate::models::BookingEvent;

/// Приводит метку к виду `HH:MM`: `"9:00"`, `"09:00"` и `"09:00:00"` - один и тот же слот.
pub fn normalize_label(label: &str) -> Option<String> {
    let mut parts = label.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if let Some(seconds) = parts.next() {
        seconds.parse::<u32>().ok()?;
    }
    if parts.next().is_some() || hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(format!("{:02}:{:02}", hours, minutes))
}

/// Включительный диапазон индексов слотов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRange {
    pub start: usize,
    pub end: usize,
}

impl SlotRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    pub fn overlaps(&self, other: &SlotRange) -> bool {
        !(other.end < self.start || other.start > self.end)
    }
}

/// Упорядоченная последовательность меток времени. Идентичность слота - его индекс.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    labels: Vec<String>,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::hourly(7, 22)
    }
}

impl TimeGrid {
    /// Часовые слоты с `first_hour` по `last_hour` включительно.
    pub fn hourly(first_hour: u32, last_hour: u32) -> Self {
        let last_hour = last_hour.min(23).max(first_hour);
        let labels = (first_hour..=last_hour)
            .map(|h| format!("{:02}:00", h))
            .collect();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        let normalized = normalize_label(label)?;
        self.labels.iter().position(|l| *l == normalized)
    }

    /// Количество занятых слотов: `max(1, end - start + 1)`.
    /// Без конца или с неизвестной меткой - один слот.
    pub fn span(&self, start: &str, end: Option<&str>) -> usize {
        let Some(end) = end else { return 1 };
        match (self.index_of(start), self.index_of(end)) {
            (Some(s), Some(e)) if e >= s => e - s + 1,
            _ => 1,
        }
    }

    /// Диапазон записи. `None`, если время начала не из сетки.
    /// Неизвестный или более ранний конец трактуется как одиночный слот.
    pub fn range(&self, start: &str, end: Option<&str>) -> Option<SlotRange> {
        let s = self.index_of(start)?;
        let e = end.and_then(|e| self.index_of(e)).filter(|e| *e >= s).unwrap_or(s);
        Some(SlotRange::new(s, e))
    }

    pub fn event_range(&self, event: &BookingEvent) -> Option<SlotRange> {
        self.range(&event.time, event.end_time.as_deref())
    }

    pub fn is_time_in_event(&self, time: &str, event: &BookingEvent) -> bool {
        match (self.index_of(time), self.event_range(event)) {
            (Some(t), Some(range)) => range.contains(t),
            _ => false,
        }
    }

    /// Пересекаются ли диапазоны двух записей (включительно).
    /// Запись с меткой вне сетки ни с чем не пересекается.
    pub fn events_overlap(&self, a: &BookingEvent, b: &BookingEvent) -> bool {
        let (Some(ra), Some(rb)) = (self.strict_range(a), self.strict_range(b)) else {
            return false;
        };
        ra.overlaps(&rb)
    }

    fn strict_range(&self, event: &BookingEvent) -> Option<SlotRange> {
        let start = self.index_of(&event.time)?;
        let end = match event.end_time.as_deref() {
            Some(end) => self.index_of(end)?,
            None => start,
        };
        Some(SlotRange::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;
    use proptest::prelude::*;

    fn event(time: &str, end: Option<&str>) -> BookingEvent {
        BookingEvent {
            id: format!("e-{}", time),
            title: "Йога".into(),
            time: time.into(),
            end_time: end.map(Into::into),
            status: EventStatus::Reserved,
            color: EventStatus::Reserved.color().into(),
            clients: vec![],
            coach: None,
            capacity: None,
            people_count: None,
            phone: None,
            note: None,
        }
    }

    #[test]
    fn default_grid_is_sixteen_hourly_slots() {
        let grid = TimeGrid::default();
        assert_eq!(grid.len(), 16);
        assert_eq!(grid.label(0), Some("07:00"));
        assert_eq!(grid.label(15), Some("22:00"));
    }

    #[test]
    fn labels_are_normalized() {
        let grid = TimeGrid::hourly(8, 21);
        assert_eq!(grid.index_of("9:00"), Some(1));
        assert_eq!(grid.index_of("09:00"), Some(1));
        assert_eq!(grid.index_of("09:00:00"), Some(1));
        assert_eq!(grid.index_of("9:30"), None);
        assert_eq!(grid.index_of("утро"), None);
        assert_eq!(normalize_label("25:00"), None);
    }

    #[test]
    fn span_falls_back_to_one() {
        let grid = TimeGrid::default();
        assert_eq!(grid.span("09:00", None), 1);
        assert_eq!(grid.span("09:00", Some("xx")), 1);
        assert_eq!(grid.span("xx", Some("12:00")), 1);
        assert_eq!(grid.span("12:00", Some("09:00")), 1);
        assert_eq!(grid.span("09:00", Some("09:00")), 1);
        assert_eq!(grid.span("09:00", Some("12:00")), 4);
    }

    #[test]
    fn overlap_is_inclusive() {
        let grid = TimeGrid::default();
        let a = event("09:00", Some("11:00"));
        assert!(grid.events_overlap(&a, &event("11:00", None)));
        assert!(grid.events_overlap(&a, &event("08:00", Some("09:00"))));
        assert!(!grid.events_overlap(&a, &event("12:00", Some("14:00"))));
        assert!(!grid.events_overlap(&a, &event("06:00", None)));
    }

    #[test]
    fn time_in_event_range() {
        let grid = TimeGrid::default();
        let e = event("09:00", Some("11:00"));
        assert!(grid.is_time_in_event("10:00", &e));
        assert!(grid.is_time_in_event("11:00", &e));
        assert!(!grid.is_time_in_event("12:00", &e));
    }

    proptest! {
        #[test]
        fn span_matches_index_arithmetic(s in 0usize..16, e in 0usize..16) {
            let grid = TimeGrid::default();
            let start = grid.label(s).unwrap().to_string();
            let end = grid.label(e).unwrap().to_string();
            let span = grid.span(&start, Some(&end));
            prop_assert!(span >= 1);
            if e >= s {
                prop_assert_eq!(span, e - s + 1);
            } else {
                prop_assert_eq!(span, 1);
            }
        }

        #[test]
        fn overlap_iff_ranges_intersect(
            s1 in 0usize..16, l1 in 0usize..4,
            s2 in 0usize..16, l2 in 0usize..4,
        ) {
            let grid = TimeGrid::default();
            let e1 = (s1 + l1).min(15);
            let e2 = (s2 + l2).min(15);
            let a = event(grid.label(s1).unwrap(), Some(grid.label(e1).unwrap()));
            let b = event(grid.label(s2).unwrap(), Some(grid.label(e2).unwrap()));
            let expected = s1 <= e2 && s2 <= e1;
            prop_assert_eq!(grid.events_overlap(&a, &b), expected);
            prop_assert_eq!(grid.events_overlap(&b, &a), expected);
        }
    }
}
