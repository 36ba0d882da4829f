//! Сетка слотов: ключи ячеек, хранилище, перенос и растягивание карточек.

pub mod relocate;
pub mod resize;
pub mod resources;
pub mod store;
pub mod time_slots;
pub mod view;

pub use relocate::{move_event, MoveOutcome};
pub use resize::{adjust_span, can_adjust_span, set_span};
pub use store::{SlotKey, SlotStore};
pub use time_slots::{normalize_label, SlotRange, TimeGrid};

use thiserror::Error;

/// Причины, по которым операция над сеткой отклонена. Хранилище при этом не меняется.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("В исходной ячейке нет записи")]
    SourceEmpty,
    #[error("Ячейка уже занята")]
    TargetOccupied,
    #[error("Неизвестное время слота: {0}")]
    UnknownTime(String),
    #[error("Запись выходит за пределы расписания")]
    OutOfRange,
    #[error("Пересечение с другой записью в этой колонке")]
    Conflict,
    #[error("Запись не может быть короче одного слота")]
    ShrinkBelowOne,
    #[error("Некорректный ключ ячейки: {0}")]
    BadKey(String),
}
