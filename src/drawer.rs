//! Боковая панель записи: просмотр, создание, правка занятия, выбор тренера,
//! оплата и удаление. Каждое состояние хранит свою форму, закрытие её сбрасывает.
//! `submit` превращает накопленные изменения в `DrawerAction` для сервиса доски.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::BoardError;
use crate::grid::resize::{check_span, end_label};
use crate::grid::{SlotKey, SlotStore};
use crate::models::{BookingEvent, EventStatus, Trainer};
use crate::services::payment::{PaymentBreakdown, PaymentForm};

pub const DEFAULT_CLIENT_NAME: &str = "Новый клиент";

fn default_one() -> u32 {
    1
}

fn default_span() -> usize {
    1
}

/// Форма новой записи.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateBookingForm {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub client_name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub trainer_name: Option<String>,
    #[serde(default = "default_one")]
    #[validate(range(min = 1))]
    pub capacity: u32,
    #[serde(default = "default_span")]
    #[validate(range(min = 1))]
    pub span: usize,
    #[serde(default = "default_status")]
    pub status: EventStatus,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_status() -> EventStatus {
    EventStatus::Reserved
}

impl Default for CreateBookingForm {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            phone: None,
            client_id: None,
            service_name: None,
            trainer_id: None,
            trainer_name: None,
            capacity: 1,
            span: 1,
            status: EventStatus::Reserved,
            note: None,
        }
    }
}

impl CreateBookingForm {
    pub fn display_name(&self) -> &str {
        let name = self.client_name.trim();
        if name.is_empty() {
            DEFAULT_CLIENT_NAME
        } else {
            name
        }
    }
}

/// Правка параметров занятия: название, тренер, вместимость, заметка.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClassForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub coach: Option<String>,
    #[serde(default = "default_one")]
    #[validate(range(min = 1))]
    pub capacity: u32,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerChoice {
    pub trainer_id: String,
    pub trainer_name: String,
}

/// Изменения, накопленные в режиме просмотра.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<usize>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.span.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawerAction {
    Create { slot: SlotKey, form: CreateBookingForm },
    SaveChanges { id: String, slot: SlotKey, changes: EventChanges },
    UpdateClass { id: String, form: ClassForm },
    AssignTrainer { id: String, trainer: TrainerChoice },
    ConfirmPayment { id: String, payment: PaymentForm },
    Delete { id: String },
}

/// Открытая запись и её черновик.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub slot: SlotKey,
    pub original: BookingEvent,
    pub event: BookingEvent,
    original_span: usize,
    span: usize,
}

impl EventDraft {
    pub fn span(&self) -> usize {
        self.span
    }

    pub fn changes(&self) -> EventChanges {
        EventChanges {
            status: (self.event.status != self.original.status).then_some(self.event.status),
            span: (self.span != self.original_span).then_some(self.span),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawerState {
    #[default]
    Closed,
    ViewingEvent(EventDraft),
    CreatingBooking { slot: SlotKey, form: CreateBookingForm },
    EditingClass { draft: EventDraft, form: ClassForm },
    PickingTrainer { draft: EventDraft, choice: Option<TrainerChoice> },
    ConfirmingPayment { draft: EventDraft, form: PaymentForm },
    ConfirmingDeletion { draft: EventDraft },
}

#[derive(Debug, Default)]
pub struct Drawer {
    state: DrawerState,
}

impl Drawer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DrawerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != DrawerState::Closed
    }

    pub fn draft(&self) -> Option<&EventDraft> {
        match &self.state {
            DrawerState::ViewingEvent(draft)
            | DrawerState::EditingClass { draft, .. }
            | DrawerState::PickingTrainer { draft, .. }
            | DrawerState::ConfirmingPayment { draft, .. }
            | DrawerState::ConfirmingDeletion { draft } => Some(draft),
            DrawerState::Closed | DrawerState::CreatingBooking { .. } => None,
        }
    }

    pub fn close(&mut self) {
        self.state = DrawerState::Closed;
    }

    /// Открывает запись в ячейке. Клик по продолжению многослотовой записи
    /// открывает саму запись.
    pub fn open_event(&mut self, store: &SlotStore, slot: &SlotKey) -> Result<(), BoardError> {
        let (key, event) = store
            .covering(slot)
            .ok_or_else(|| BoardError::NotFound(slot.to_string()))?;
        let span = store.grid().span(&event.time, event.end_time.as_deref());
        self.state = DrawerState::ViewingEvent(EventDraft {
            slot: key.clone(),
            original: event.clone(),
            event: event.clone(),
            original_span: span,
            span,
        });
        Ok(())
    }

    pub fn open_create(&mut self, slot: SlotKey) {
        self.state = DrawerState::CreatingBooking {
            slot,
            form: CreateBookingForm::default(),
        };
    }

    fn viewing(&self) -> Result<&EventDraft, BoardError> {
        match &self.state {
            DrawerState::ViewingEvent(draft) => Ok(draft),
            _ => Err(BoardError::InvalidState("запись не открыта для просмотра")),
        }
    }

    fn viewing_mut(&mut self) -> Result<&mut EventDraft, BoardError> {
        match &mut self.state {
            DrawerState::ViewingEvent(draft) => Ok(draft),
            _ => Err(BoardError::InvalidState("запись не открыта для просмотра")),
        }
    }

    pub fn edit_class(&mut self) -> Result<(), BoardError> {
        let draft = self.viewing()?.clone();
        let form = ClassForm {
            title: draft.event.title.clone(),
            coach: draft.event.coach.clone(),
            capacity: draft.event.capacity.unwrap_or(1).max(1),
            note: draft.event.note.clone(),
        };
        self.state = DrawerState::EditingClass { draft, form };
        Ok(())
    }

    pub fn pick_trainer(&mut self) -> Result<(), BoardError> {
        let draft = self.viewing()?.clone();
        self.state = DrawerState::PickingTrainer { draft, choice: None };
        Ok(())
    }

    pub fn start_payment(&mut self) -> Result<(), BoardError> {
        let draft = self.viewing()?.clone();
        self.state = DrawerState::ConfirmingPayment {
            draft,
            form: PaymentForm::default(),
        };
        Ok(())
    }

    pub fn request_delete(&mut self) -> Result<(), BoardError> {
        let draft = self.viewing()?.clone();
        self.state = DrawerState::ConfirmingDeletion { draft };
        Ok(())
    }

    /// Удлиняет черновик на слот. Отклоняется, если следующий слот занят
    /// другой записью этой колонки или выходит за сетку.
    pub fn extend(&mut self, store: &SlotStore) -> Result<(), BoardError> {
        let draft = self.viewing_mut()?;
        let range = check_span(store, &draft.slot, draft.span + 1)?;
        draft.span = range.len();
        draft.event.end_time = end_label(store, range);
        Ok(())
    }

    /// Укорачивает черновик на слот; у однослотовой записи ничего не меняется.
    pub fn shorten(&mut self, store: &SlotStore) -> Result<(), BoardError> {
        let draft = self.viewing_mut()?;
        if draft.span <= 1 {
            return Ok(());
        }
        let range = check_span(store, &draft.slot, draft.span - 1)?;
        draft.span = range.len();
        draft.event.end_time = end_label(store, range);
        Ok(())
    }

    pub fn set_status(&mut self, status: EventStatus) -> Result<(), BoardError> {
        let draft = self.viewing_mut()?;
        if draft.event.color == draft.event.status.color() {
            draft.event.color = status.color().to_string();
        }
        draft.event.status = status;
        Ok(())
    }

    pub fn back(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            DrawerState::EditingClass { draft, .. }
            | DrawerState::PickingTrainer { draft, .. }
            | DrawerState::ConfirmingPayment { draft, .. }
            | DrawerState::ConfirmingDeletion { draft } => DrawerState::ViewingEvent(draft),
            _ => DrawerState::Closed,
        };
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateBookingForm> {
        match &mut self.state {
            DrawerState::CreatingBooking { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn class_form_mut(&mut self) -> Option<&mut ClassForm> {
        match &mut self.state {
            DrawerState::EditingClass { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn payment_form_mut(&mut self) -> Option<&mut PaymentForm> {
        match &mut self.state {
            DrawerState::ConfirmingPayment { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn choose_trainer(&mut self, trainer: &Trainer) -> Result<(), BoardError> {
        match &mut self.state {
            DrawerState::PickingTrainer { choice, .. } => {
                *choice = Some(TrainerChoice {
                    trainer_id: trainer.id.clone(),
                    trainer_name: trainer.full_name.clone(),
                });
                Ok(())
            }
            _ => Err(BoardError::InvalidState("выбор тренера не открыт")),
        }
    }

    /// Собирает действие из текущего состояния и закрывает панель.
    /// Ошибка валидации оставляет панель открытой с введёнными данными.
    pub fn submit(&mut self) -> Result<Option<DrawerAction>, BoardError> {
        let action = match &self.state {
            DrawerState::Closed => None,
            DrawerState::ViewingEvent(draft) => {
                let changes = draft.changes();
                (!changes.is_empty()).then(|| DrawerAction::SaveChanges {
                    id: draft.event.id.clone(),
                    slot: draft.slot.clone(),
                    changes,
                })
            }
            DrawerState::CreatingBooking { slot, form } => {
                form.validate()?;
                let mut form = form.clone();
                form.client_name = form.display_name().to_string();
                Some(DrawerAction::Create {
                    slot: slot.clone(),
                    form,
                })
            }
            DrawerState::EditingClass { draft, form } => {
                form.validate()?;
                Some(DrawerAction::UpdateClass {
                    id: draft.event.id.clone(),
                    form: form.clone(),
                })
            }
            DrawerState::PickingTrainer { draft, choice } => {
                let trainer = choice
                    .clone()
                    .ok_or(BoardError::InvalidState("тренер не выбран"))?;
                Some(DrawerAction::AssignTrainer {
                    id: draft.event.id.clone(),
                    trainer,
                })
            }
            DrawerState::ConfirmingPayment { draft, form } => {
                PaymentBreakdown::from_form(form)?;
                Some(DrawerAction::ConfirmPayment {
                    id: draft.event.id.clone(),
                    payment: form.clone(),
                })
            }
            DrawerState::ConfirmingDeletion { draft } => Some(DrawerAction::Delete {
                id: draft.event.id.clone(),
            }),
        };
        self.close();
        Ok(action)
    }
}
