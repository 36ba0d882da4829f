//! board.rs
//!
//! Сервис доски: загружает день или неделю из CRM, раскладывает записи по
//! сетке, проверяет перенос и растягивание локально и отправляет изменение
//! в API. После каждой мутации состояние перечитывается из CRM, локальные
//! правки между запросами не хранятся.

use chrono::{Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::crm_client::CrmClient;
use crate::drawer::{ClassForm, CreateBookingForm, DrawerAction, EventChanges};
use crate::error::BoardError;
use crate::grid::resize::{check_span, set_span};
use crate::grid::resources::{
    category_for, date_for_day_key, is_day_key, overview_column, track_category, week_start,
    week_track, COWORK_GROUP,
};
use crate::grid::view::{self, BoardFilter, OverviewView, WeekView};
use crate::grid::{adjust_span, move_event, MoveOutcome, SlotError, SlotKey, SlotStore, TimeGrid};
use crate::models::booking::{CATEGORY_BODY_MIND, CATEGORY_PILATES_REFORMER};
use crate::models::client::{ClientCreate, ClientFilter};
use crate::models::{
    BookingEvent, BookingFilter, BookingStatus, Client, ClientInfo, EventStatus, ScheduleBookingCreate,
    ScheduleBookingUpdate, Trainer,
};
use crate::services::payment::PaymentBreakdown;

/// Какую сетку вернуть после действия.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Overview,
    Week,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BoardView {
    Overview(OverviewView),
    Week(WeekView),
}

#[derive(Clone)]
pub struct BoardService {
    crm: CrmClient,
    grid: TimeGrid,
    offset: FixedOffset,
}

impl BoardService {
    pub fn new(crm: CrmClient, config: &BoardConfig) -> Self {
        let offset = config.utc_offset().unwrap_or_else(|| Utc.fix());
        Self {
            crm,
            grid: TimeGrid::hourly(config.first_hour, config.last_hour),
            offset,
        }
    }

    /// Копия сервиса, которая ходит в CRM с токеном вызывающего.
    pub fn for_token(&self, token: Option<String>) -> Self {
        Self {
            crm: self.crm.authorized(token),
            ..self.clone()
        }
    }

    pub fn crm(&self) -> &CrmClient {
        &self.crm
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Текущая дата в часовом поясе центра.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    async fn load_day(&self, date: NaiveDate) -> Result<SlotStore, BoardError> {
        let bookings = self.crm.list_bookings(&BookingFilter::for_dates(date, date)).await?;
        debug!("Loaded {} bookings for {}", bookings.len(), date);
        Ok(SlotStore::from_overview(self.grid.clone(), &bookings))
    }

    async fn load_week(&self, monday: NaiveDate) -> Result<SlotStore, BoardError> {
        let filter = BookingFilter::for_dates(monday, monday + Duration::days(6));
        let body_filter = filter.clone().with_category(CATEGORY_BODY_MIND);
        let reform_filter = filter.with_category(CATEGORY_PILATES_REFORMER);
        let (mut body, reform) = futures::try_join!(
            self.crm.list_bookings(&body_filter),
            self.crm.list_bookings(&reform_filter),
        )?;
        body.extend(reform);
        debug!("Loaded {} bookings for week of {}", body.len(), monday);
        Ok(SlotStore::from_week(self.grid.clone(), monday, &body))
    }

    async fn load(&self, kind: ViewKind, date: NaiveDate) -> Result<SlotStore, BoardError> {
        match kind {
            ViewKind::Overview => self.load_day(date).await,
            ViewKind::Week => self.load_week(week_start(date)).await,
        }
    }

    pub async fn overview(&self, date: NaiveDate, filter: &BoardFilter) -> Result<OverviewView, BoardError> {
        let store = self.load_day(date).await?;
        Ok(view::overview(&store, date, filter))
    }

    pub async fn schedule(&self, date: NaiveDate, filter: &BoardFilter) -> Result<WeekView, BoardError> {
        let monday = week_start(date);
        let store = self.load_week(monday).await?;
        Ok(view::week(&store, monday, filter))
    }

    async fn view(&self, kind: ViewKind, date: NaiveDate) -> Result<BoardView, BoardError> {
        let filter = BoardFilter::default();
        Ok(match kind {
            ViewKind::Overview => BoardView::Overview(self.overview(date, &filter).await?),
            ViewKind::Week => BoardView::Week(self.schedule(date, &filter).await?),
        })
    }

    /// Перенос карточки в обзоре дня.
    pub async fn move_overview(
        &self,
        date: NaiveDate,
        source: &SlotKey,
        target: &SlotKey,
    ) -> Result<OverviewView, BoardError> {
        let category = category_for(&target.group, &target.column)
            .ok_or_else(|| BoardError::BadRequest(format!("Неизвестная колонка: {}", target)))?;

        let mut store = self.load_day(date).await?;
        if let MoveOutcome::Moved { from, to, event } = move_event(&mut store, source, target)? {
            let mut update = time_update(&event);
            if from.group != to.group || from.column != to.column {
                update.category = Some(category.to_string());
                if to.group == COWORK_GROUP {
                    update.capsule_id = Some(to.column.clone());
                    update.capsule_name = overview_column(&to.group, &to.column).map(|c| c.label.to_string());
                }
            }
            self.crm.update_booking(&event.id, &update).await?;
            info!("Booking {} moved {} -> {}", event.id, from, to);
        }

        self.overview(date, &BoardFilter::default()).await
    }

    /// Перенос занятия в недельном расписании, в том числе на другой день.
    pub async fn move_week(
        &self,
        date: NaiveDate,
        source: &SlotKey,
        target: &SlotKey,
    ) -> Result<WeekView, BoardError> {
        let monday = week_start(date);
        if !is_day_key(&target.group) || week_track(&target.column).is_none() {
            return Err(BoardError::BadRequest(format!("Неизвестная ячейка расписания: {}", target)));
        }

        let mut store = self.load_week(monday).await?;
        if let MoveOutcome::Moved { from, to, event } = move_event(&mut store, source, target)? {
            let mut update = time_update(&event);
            if from.group != to.group {
                update.booking_date = date_for_day_key(monday, &to.group).map(|d| d.format("%Y-%m-%d").to_string());
            }
            if from.column != to.column {
                update.category = track_category(&to.column).map(str::to_string);
            }
            self.crm.update_booking(&event.id, &update).await?;
            info!("Class {} moved {} -> {}", event.id, from, to);
        }

        self.schedule(date, &BoardFilter::default()).await
    }

    /// Растягивает или укорачивает запись в обзоре на `delta` слотов.
    /// Укорачивание однослотовой записи ничего не делает.
    pub async fn resize_overview(
        &self,
        date: NaiveDate,
        slot: &SlotKey,
        delta: i32,
    ) -> Result<OverviewView, BoardError> {
        let mut store = self.load_day(date).await?;
        match adjust_span(&mut store, slot, delta) {
            Ok(event) => {
                self.update_with_end(&event.id, &end_update(&event)).await?;
                info!("Booking {} now ends at {:?}", event.id, event.end_time);
            }
            Err(SlotError::ShrinkBelowOne) => {
                debug!("Booking at {} is already one slot long", slot);
            }
            Err(e) => return Err(e.into()),
        }
        self.overview(date, &BoardFilter::default()).await
    }

    /// PATCH с концом записи. CRM без поля `booking_end_time` молча его
    /// отбрасывает, и длительность не сохраняется.
    async fn update_with_end(&self, id: &str, update: &ScheduleBookingUpdate) -> Result<(), BoardError> {
        let saved = self.crm.update_booking(id, update).await?;
        if update.booking_end_time.is_some() && saved.booking_end_time.is_none() {
            warn!(
                "CRM dropped booking_end_time for booking {}; span change was not stored",
                id
            );
        }
        Ok(())
    }

    /// Исполняет действие панели записи и возвращает перечитанную сетку.
    pub async fn apply(
        &self,
        date: NaiveDate,
        kind: ViewKind,
        action: DrawerAction,
    ) -> Result<BoardView, BoardError> {
        match action {
            DrawerAction::Create { slot, form } => self.create(date, kind, &slot, form).await?,
            DrawerAction::SaveChanges { id, slot, changes } => {
                self.save_changes(date, kind, &id, &slot, changes).await?
            }
            DrawerAction::UpdateClass { id, form } => self.update_class(&id, form).await?,
            DrawerAction::AssignTrainer { id, trainer } => {
                let update = ScheduleBookingUpdate {
                    trainer_id: Some(trainer.trainer_id),
                    trainer_name: Some(trainer.trainer_name),
                    ..Default::default()
                };
                self.crm.update_booking(&id, &update).await?;
                info!("Trainer assigned to booking {}", id);
            }
            DrawerAction::ConfirmPayment { id, payment } => {
                let breakdown = PaymentBreakdown::from_form(&payment)?;
                self.confirm_payment(&id, breakdown).await?
            }
            DrawerAction::Delete { id } => self.crm.delete_booking(&id).await?,
        }
        self.view(kind, date).await
    }

    async fn create(
        &self,
        date: NaiveDate,
        kind: ViewKind,
        slot: &SlotKey,
        form: CreateBookingForm,
    ) -> Result<(), BoardError> {
        use validator::Validate;
        form.validate()?;

        let (booking_date, category) = match kind {
            ViewKind::Overview => (Some(date), category_for(&slot.group, &slot.column)),
            ViewKind::Week => (
                date_for_day_key(week_start(date), &slot.group),
                track_category(&slot.column),
            ),
        };
        let (Some(booking_date), Some(category)) = (booking_date, category) else {
            return Err(BoardError::BadRequest(format!("Неизвестная ячейка: {}", slot)));
        };

        let store = self.load(kind, date).await?;
        if store.covering(slot).is_some() {
            return Err(SlotError::TargetOccupied.into());
        }
        let range = check_span(&store, slot, form.span)?;
        let end_time = crate::grid::resize::end_label(&store, range);

        let name = form.display_name().to_string();
        let client = self.resolve_client(&form, &name).await?;
        let clients: Vec<ClientInfo> = client
            .into_iter()
            .map(|c| ClientInfo {
                client_id: c.id,
                client_name: c.name,
                client_phone: Some(c.phone).filter(|p| !p.is_empty()),
            })
            .collect();
        let service_name = form
            .service_name
            .clone()
            .or_else(|| clients.is_empty().then(|| name.clone()));
        let capsule = (slot.group == COWORK_GROUP).then(|| slot.column.clone());

        let booking = ScheduleBookingCreate {
            booking_date: booking_date.format("%Y-%m-%d").to_string(),
            booking_time: slot.time.clone(),
            booking_end_time: end_time,
            category: category.to_string(),
            service_name,
            trainer_id: form.trainer_id.clone(),
            trainer_name: form.trainer_name.clone(),
            clients,
            max_capacity: form.capacity,
            status: form.status.into(),
            notes: form.note.clone().filter(|n| !n.trim().is_empty()),
            capsule_name: capsule
                .as_deref()
                .and_then(|c| overview_column(COWORK_GROUP, c))
                .map(|c| c.label.to_string()),
            capsule_id: capsule,
        };
        self.crm.create_booking(&booking).await?;
        Ok(())
    }

    /// Клиент записи: выбранный из списка, либо новый, если указан телефон.
    async fn resolve_client(&self, form: &CreateBookingForm, name: &str) -> Result<Option<Client>, BoardError> {
        if let Some(id) = form.client_id.as_deref().filter(|id| !id.is_empty()) {
            return Ok(Some(self.crm.get_client(id).await?));
        }
        let Some(phone) = form.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        let created = self
            .crm
            .create_client(&ClientCreate {
                name: name.to_string(),
                phone: phone.to_string(),
                source: Some("board".to_string()),
                ..Default::default()
            })
            .await?;
        info!("Client {} created from the board", created.id);
        Ok(Some(created))
    }

    async fn save_changes(
        &self,
        date: NaiveDate,
        kind: ViewKind,
        id: &str,
        slot: &SlotKey,
        changes: EventChanges,
    ) -> Result<(), BoardError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut update = ScheduleBookingUpdate {
            status: changes.status.map(BookingStatus::from),
            ..Default::default()
        };

        if let Some(span) = changes.span {
            let mut store = self.load(kind, date).await?;
            match store.get(slot) {
                Some(event) if event.id == id => {}
                _ => return Err(BoardError::NotFound(id.to_string())),
            }
            let event = set_span(&mut store, slot, span)?;
            update.booking_end_time = end_update(&event).booking_end_time;
        }

        self.update_with_end(id, &update).await?;
        info!("Booking {} saved", id);
        Ok(())
    }

    async fn update_class(&self, id: &str, form: ClassForm) -> Result<(), BoardError> {
        use validator::Validate;
        form.validate()?;
        let update = ScheduleBookingUpdate {
            service_name: Some(form.title),
            trainer_name: form.coach,
            max_capacity: Some(form.capacity),
            notes: form.note,
            ..Default::default()
        };
        self.crm.update_booking(id, &update).await?;
        Ok(())
    }

    /// Записывает платёж, дописывает разбивку в заметку и помечает запись оплаченной.
    async fn confirm_payment(&self, id: &str, breakdown: PaymentBreakdown) -> Result<(), BoardError> {
        let booking = self.crm.get_booking(id).await?;
        let event = BookingEvent::from_booking(&booking);
        let client_id = booking.clients.first().map(|c| c.client_id.clone());

        self.crm
            .create_payment(&breakdown.to_payment(&event, Some(&booking.category), client_id))
            .await?;

        let update = ScheduleBookingUpdate {
            status: Some(EventStatus::Paid.into()),
            notes: Some(breakdown.append_to(booking.notes.as_deref())),
            ..Default::default()
        };
        self.crm.update_booking(id, &update).await?;
        info!("Booking {} paid: {} сум", id, breakdown.total);
        Ok(())
    }

    /// Поиск клиентов для выбора в форме записи.
    pub async fn search_clients(&self, query: Option<String>) -> Result<Vec<Client>, BoardError> {
        let filter = ClientFilter {
            query: query.filter(|q| !q.trim().is_empty()),
            ..Default::default()
        };
        Ok(self.crm.list_clients(&filter).await?)
    }

    pub async fn trainers(&self) -> Result<Vec<Trainer>, BoardError> {
        Ok(self.crm.list_trainers().await?)
    }
}

fn time_update(event: &BookingEvent) -> ScheduleBookingUpdate {
    ScheduleBookingUpdate {
        booking_time: Some(event.time.clone()),
        ..end_update(event)
    }
}

/// PATCH не умеет очищать поле, поэтому у однослотовой записи конец равен началу.
fn end_update(event: &BookingEvent) -> ScheduleBookingUpdate {
    ScheduleBookingUpdate {
        booking_end_time: Some(event.end_time.clone().unwrap_or_else(|| event.time.clone())),
        ..Default::default()
    }
}
