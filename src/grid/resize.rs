use super::store::{SlotKey, SlotStore};
use super::time_slots::SlotRange;
use super::SlotError;
use crate::models::BookingEvent;

/// Проверяет, что запись, начинающаяся в `key`, может занимать `span` слотов:
/// не короче одного, не дальше конца сетки и без пересечений в своей колонке.
pub fn check_span(store: &SlotStore, key: &SlotKey, span: usize) -> Result<SlotRange, SlotError> {
    if span < 1 {
        return Err(SlotError::ShrinkBelowOne);
    }
    let grid = store.grid();
    let start = grid
        .index_of(&key.time)
        .ok_or_else(|| SlotError::UnknownTime(key.time.clone()))?;
    let end = start + span - 1;
    if end >= grid.len() {
        return Err(SlotError::OutOfRange);
    }
    let range = SlotRange::new(start, end);
    if store.has_conflict(key, &key.group, &key.column, range) {
        return Err(SlotError::Conflict);
    }
    Ok(range)
}

fn current_span(store: &SlotStore, event: &BookingEvent) -> usize {
    store.grid().span(&event.time, event.end_time.as_deref())
}

fn span_with_delta(current: usize, delta: i32) -> Result<usize, SlotError> {
    let span = current as i64 + delta as i64;
    if span < 1 {
        return Err(SlotError::ShrinkBelowOne);
    }
    Ok(span as usize)
}

/// Конечная метка для диапазона: у одиночного слота её нет.
pub fn end_label(store: &SlotStore, range: SlotRange) -> Option<String> {
    if range.len() == 1 {
        None
    } else {
        store.grid().label(range.end).map(str::to_string)
    }
}

fn apply(store: &mut SlotStore, key: &SlotKey, range: SlotRange) -> Result<BookingEvent, SlotError> {
    let end_time = end_label(store, range);
    let mut event = store.get(key).cloned().ok_or(SlotError::SourceEmpty)?;
    event.end_time = end_time;
    store.insert(key.clone(), event.clone());
    Ok(event)
}

/// Растягивает (`delta = 1`) или укорачивает (`delta = -1`) запись на один слот.
pub fn adjust_span(store: &mut SlotStore, key: &SlotKey, delta: i32) -> Result<BookingEvent, SlotError> {
    let event = store.get(key).ok_or(SlotError::SourceEmpty)?;
    let span = span_with_delta(current_span(store, event), delta)?;
    let range = check_span(store, key, span)?;
    apply(store, key, range)
}

pub fn can_adjust_span(store: &SlotStore, key: &SlotKey, delta: i32) -> bool {
    let Some(event) = store.get(key) else {
        return false;
    };
    span_with_delta(current_span(store, event), delta)
        .and_then(|span| check_span(store, key, span))
        .is_ok()
}

/// Устанавливает длительность записи; значения меньше одного слота приводятся к одному.
pub fn set_span(store: &mut SlotStore, key: &SlotKey, span: usize) -> Result<BookingEvent, SlotError> {
    let event = store.get(key).ok_or(SlotError::SourceEmpty)?;
    let span = span.max(1);
    if current_span(store, event) == span {
        return Ok(event.clone());
    }
    let range = check_span(store, key, span)?;
    apply(store, key, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::store::tests::{event, key};
    use crate::grid::TimeGrid;
    use crate::models::EventStatus;

    fn store() -> SlotStore {
        let mut store = SlotStore::new(TimeGrid::default());
        store.insert(key("bodymind", "body", "09:00"), event("a", "09:00", None, EventStatus::Paid));
        store.insert(
            key("bodymind", "body", "10:00"),
            event("b", "10:00", Some("11:00"), EventStatus::Reserved),
        );
        store.insert(key("bodymind", "reform", "21:00"), event("c", "21:00", None, EventStatus::Free));
        store
    }

    #[test]
    fn extend_into_covered_slot_is_rejected() {
        let mut store = store();
        let a = key("bodymind", "body", "09:00");
        assert!(!can_adjust_span(&store, &a, 1));
        assert_eq!(adjust_span(&mut store, &a, 1), Err(SlotError::Conflict));
        assert!(store.get(&a).unwrap().end_time.is_none());
    }

    #[test]
    fn extend_and_shrink_free_slots() {
        let mut store = store();
        let b = key("bodymind", "body", "10:00");
        let extended = adjust_span(&mut store, &b, 1).unwrap();
        assert_eq!(extended.end_time.as_deref(), Some("12:00"));

        let shrunk = adjust_span(&mut store, &b, -1).unwrap();
        assert_eq!(shrunk.end_time.as_deref(), Some("11:00"));
        let single = adjust_span(&mut store, &b, -1).unwrap();
        assert_eq!(single.end_time, None);
    }

    #[test]
    fn shrink_below_one_slot_is_a_noop() {
        let mut store = store();
        let a = key("bodymind", "body", "09:00");
        let before = store.get(&a).cloned();
        assert!(!can_adjust_span(&store, &a, -1));
        assert_eq!(adjust_span(&mut store, &a, -1), Err(SlotError::ShrinkBelowOne));
        assert_eq!(store.get(&a).cloned(), before);
    }

    #[test]
    fn extend_past_last_slot_is_rejected() {
        let mut store = store();
        let c = key("bodymind", "reform", "21:00");
        assert_eq!(adjust_span(&mut store, &c, 1).unwrap().end_time.as_deref(), Some("22:00"));
        assert_eq!(adjust_span(&mut store, &c, 1), Err(SlotError::OutOfRange));
    }

    #[test]
    fn set_span_clamps_to_one() {
        let mut store = store();
        let b = key("bodymind", "body", "10:00");
        assert_eq!(set_span(&mut store, &b, 0).unwrap().end_time, None);
        assert_eq!(set_span(&mut store, &b, 3).unwrap().end_time.as_deref(), Some("12:00"));
        assert_eq!(
            set_span(&mut store, &key("kids", "kids", "10:00"), 2),
            Err(SlotError::SourceEmpty)
        );
    }
}
