use super::store::{SlotKey, SlotStore};
use super::time_slots::SlotRange;
use super::SlotError;
use crate::models::BookingEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Карточку отпустили в исходную ячейку.
    Unchanged,
    Moved {
        from: SlotKey,
        to: SlotKey,
        event: BookingEvent,
    },
}

/// Переносит запись из `source` в `target`, сохраняя её длительность.
///
/// Занятая целевая ячейка, выход за конец сетки или пересечение с другой
/// записью в целевой колонке отклоняют перенос; хранилище при этом не меняется.
pub fn move_event(store: &mut SlotStore, source: &SlotKey, target: &SlotKey) -> Result<MoveOutcome, SlotError> {
    if source == target {
        return Ok(MoveOutcome::Unchanged);
    }

    let dragged = store.get(source).ok_or(SlotError::SourceEmpty)?;
    if store.is_occupied(target) {
        return Err(SlotError::TargetOccupied);
    }

    let grid = store.grid();
    let target_index = grid
        .index_of(&target.time)
        .ok_or_else(|| SlotError::UnknownTime(target.time.clone()))?;
    let span = grid.span(&dragged.time, dragged.end_time.as_deref());
    let end_index = target_index + span - 1;
    if end_index >= grid.len() {
        return Err(SlotError::OutOfRange);
    }

    let range = SlotRange::new(target_index, end_index);
    if store.has_conflict(source, &target.group, &target.column, range) {
        return Err(SlotError::Conflict);
    }

    let mut moved = dragged.clone();
    moved.time = grid.label(target_index).unwrap_or(&target.time).to_string();
    moved.end_time = if span == 1 {
        None
    } else {
        grid.label(end_index).map(str::to_string)
    };

    store.remove(source);
    store.insert(target.clone(), moved.clone());

    Ok(MoveOutcome::Moved {
        from: source.clone(),
        to: target.clone(),
        event: moved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::store::tests::{event, key};
    use crate::grid::TimeGrid;
    use crate::models::{BookingEvent, EventStatus};

    fn snapshot(store: &SlotStore) -> Vec<(SlotKey, BookingEvent)> {
        store.iter().map(|(k, e)| (k.clone(), e.clone())).collect()
    }

    fn store() -> SlotStore {
        let mut store = SlotStore::new(TimeGrid::default());
        store.insert(
            key("cowork", "capsule-1", "09:00"),
            event("a", "09:00", Some("11:00"), EventStatus::Paid),
        );
        store.insert(key("cowork", "capsule-1", "14:00"), event("b", "14:00", None, EventStatus::Reserved));
        store.insert(key("cowork", "capsule-2", "10:00"), event("c", "10:00", None, EventStatus::Free));
        store
    }

    #[test]
    fn move_to_occupied_cell_never_mutates() {
        let mut store = store();
        let before = snapshot(&store);
        let result = move_event(
            &mut store,
            &key("cowork", "capsule-1", "09:00"),
            &key("cowork", "capsule-2", "10:00"),
        );
        assert_eq!(result, Err(SlotError::TargetOccupied));
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn move_preserves_span() {
        let mut store = store();
        let outcome = move_event(
            &mut store,
            &key("cowork", "capsule-1", "09:00"),
            &key("cowork", "capsule-3", "15:00"),
        )
        .unwrap();
        let MoveOutcome::Moved { event, .. } = outcome else {
            panic!("expected a move");
        };
        assert_eq!(event.time, "15:00");
        assert_eq!(event.end_time.as_deref(), Some("17:00"));
        assert!(store.get(&key("cowork", "capsule-1", "09:00")).is_none());
        assert_eq!(store.get(&key("cowork", "capsule-3", "15:00")), Some(&event));
    }

    #[test]
    fn move_within_own_range_is_allowed() {
        let mut store = store();
        let outcome = move_event(
            &mut store,
            &key("cowork", "capsule-1", "09:00"),
            &key("cowork", "capsule-1", "10:00"),
        );
        assert!(matches!(outcome, Ok(MoveOutcome::Moved { .. })));
        assert_eq!(
            store.get(&key("cowork", "capsule-1", "10:00")).unwrap().end_time.as_deref(),
            Some("12:00")
        );
    }

    #[test]
    fn move_rejects_conflicts_and_overflow() {
        let mut store = store();
        let before = snapshot(&store);

        // 12:00-14:00 задевает запись "b" в 14:00
        assert_eq!(
            move_event(
                &mut store,
                &key("cowork", "capsule-1", "09:00"),
                &key("cowork", "capsule-1", "12:00"),
            ),
            Err(SlotError::Conflict)
        );
        assert_eq!(
            move_event(
                &mut store,
                &key("cowork", "capsule-1", "09:00"),
                &key("cowork", "capsule-4", "21:00"),
            ),
            Err(SlotError::OutOfRange)
        );
        assert_eq!(
            move_event(
                &mut store,
                &key("cowork", "capsule-1", "09:00"),
                &key("cowork", "capsule-4", "06:00"),
            ),
            Err(SlotError::UnknownTime("06:00".into()))
        );
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn move_from_empty_or_same_cell() {
        let mut store = store();
        assert_eq!(
            move_event(
                &mut store,
                &key("kids", "kids", "09:00"),
                &key("kids", "kids", "10:00"),
            ),
            Err(SlotError::SourceEmpty)
        );
        let source = key("cowork", "capsule-1", "09:00");
        assert_eq!(move_event(&mut store, &source, &source), Ok(MoveOutcome::Unchanged));
    }
}
