//! crm_client.rs
//!
//! Типизированный клиент REST API CRM центра.
//!
//! Все сетевые вызовы проходят через `CircuitBreaker`: после серии сбоев подряд
//! (ошибки соединения и ответы 5xx) запросы временно блокируются, затем
//! пропускается один пробный запрос.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{CircuitBreakerConfig, CrmConfig};
use crate::models::auth::{LoginRequest, TokenResponse};
use crate::models::catalog::{CatalogService, CoworkingPlace, ServiceDirection};
use crate::models::client::{ClientCreate, ClientFilter, ClientUpdate};
use crate::models::payment::PaymentFilter;
use crate::models::trainer::TrainerCreate;
use crate::models::{
    BookingFilter, Client, Payment, PaymentCreate, ScheduleBooking, ScheduleBookingCreate,
    ScheduleBookingUpdate, Trainer,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("CRM API is unreachable: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Invalid CRM base URL: {0}")]
    BaseUrl(String),
    #[error("Invalid resource id: {0:?}")]
    InvalidId(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("CRM API responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to decode CRM API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("CRM API returned an empty body")]
    EmptyBody,
    #[error("Circuit breaker is open - CRM API temporarily unavailable")]
    CircuitOpen,
}

/// Состояния "Автоматического выключателя".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Запросы разрешены.
    Closed,
    /// Запросы блокируются до истечения таймаута.
    Open,
    /// Разрешён пробный запрос.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout_seconds: u64) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: Duration::from_secs(timeout_seconds),
        }
    }

    pub fn can_execute(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let expired = inner
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.timeout_duration);
                if expired {
                    inner.state = CircuitState::HalfOpen;
                    info!("Circuit breaker transitioning to HalfOpen state");
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == CircuitState::HalfOpen {
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());
        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.failure_threshold => {
                inner.state = CircuitState::Open;
                error!(
                    "Circuit breaker OPENED - {} failures reached threshold {}",
                    inner.failure_count, self.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                warn!("Circuit breaker test failed - returning to Open state");
            }
            _ => {}
        }
    }

    pub fn get_state(&self) -> CircuitState {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).state
    }
}

/// Идентификатор записи CRM как один сегмент пути. Пустые, `.` и `..`
/// отклоняются: URL-парсер схлопывает их вместе с соседними сегментами.
fn resource_id(id: &str) -> Result<&str, ApiError> {
    match id.trim() {
        "" | "." | ".." => Err(ApiError::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}

/// Клиент CRM API. Дешёво клонируется: HTTP-клиент и выключатель общие.
#[derive(Clone)]
pub struct CrmClient {
    base_url: Url,
    token: Option<String>,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl CrmClient {
    pub fn from_config(crm: &CrmConfig, breaker: &CircuitBreakerConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(crm.timeout_seconds))
            .build()
            .map_err(ApiError::Client)?;
        let base_url = Url::parse(&crm.base_url).map_err(|e| ApiError::BaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(crm.base_url.clone()));
        }

        Ok(Self {
            base_url,
            token: crm.token.clone(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                breaker.timeout_seconds,
            )),
        })
    }

    /// Копия клиента с токеном вызывающего; без токена остаётся сервисный.
    pub fn authorized(&self, token: Option<String>) -> Self {
        let mut client = self.clone();
        if token.is_some() {
            client.token = token;
        }
        client
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.get_state()
    }

    /// Собирает URL из сегментов пути. Каждый сегмент кодируется целиком,
    /// поэтому `/`, `?` и `#` в идентификаторе не меняют адрес запроса.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let builder = self.http_client.request(method, self.endpoint(segments)?);
        match &self.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    /// Отправляет запрос через выключатель. `Ok(None)` - ответ 204 или пустое тело.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking CRM API request");
            return Err(ApiError::CircuitOpen);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("CRM API request failed: {:?}", e);
                self.circuit_breaker.record_failure();
                return Err(ApiError::Connection(e));
            }
        };

        let status = response.status();
        debug!("CRM API {} -> {}", response.url().path(), status);
        if status.is_server_error() {
            self.circuit_breaker.record_failure();
        } else {
            self.circuit_breaker.record_success();
        }

        match status {
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound),
            StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
            StatusCode::NO_CONTENT => return Ok(None),
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let bytes = response.bytes().await.map_err(ApiError::Connection)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request).await?.ok_or(ApiError::EmptyBody)
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, ApiError> {
        self.fetch(self.request(Method::GET, path)?).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &[&str],
        query: &Q,
    ) -> Result<T, ApiError> {
        self.fetch(self.request(Method::GET, path)?.query(query)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> Result<T, ApiError> {
        self.fetch(self.request(Method::POST, path)?.json(body)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> Result<T, ApiError> {
        self.fetch(self.request(Method::PATCH, path)?.json(body)).await
    }

    async fn delete(&self, path: &[&str]) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.request(Method::DELETE, path)?)
            .await
            .map(|_| ())
    }

    // --- Расписание ---

    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<ScheduleBooking>, ApiError> {
        self.get_with(&["api", "schedule", "bookings"], filter).await
    }

    pub async fn get_booking(&self, id: &str) -> Result<ScheduleBooking, ApiError> {
        self.get(&["api", "schedule", "bookings", resource_id(id)?]).await
    }

    pub async fn create_booking(&self, booking: &ScheduleBookingCreate) -> Result<ScheduleBooking, ApiError> {
        let created: ScheduleBooking = self.post(&["api", "schedule", "bookings"], booking).await?;
        info!("Booking {} created for {} {}", created.id, created.booking_date, created.booking_time);
        Ok(created)
    }

    pub async fn update_booking(
        &self,
        id: &str,
        update: &ScheduleBookingUpdate,
    ) -> Result<ScheduleBooking, ApiError> {
        let updated = self.patch(&["api", "schedule", "bookings", resource_id(id)?], update).await?;
        info!("Booking {} updated", id);
        Ok(updated)
    }

    pub async fn delete_booking(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["api", "schedule", "bookings", resource_id(id)?]).await?;
        info!("Booking {} deleted", id);
        Ok(())
    }

    // --- Клиенты ---

    pub async fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, ApiError> {
        self.get_with(&["api", "clients"], filter).await
    }

    pub async fn get_client(&self, id: &str) -> Result<Client, ApiError> {
        self.get(&["api", "clients", resource_id(id)?]).await
    }

    pub async fn create_client(&self, client: &ClientCreate) -> Result<Client, ApiError> {
        self.post(&["api", "clients"], client).await
    }

    pub async fn update_client(&self, id: &str, update: &ClientUpdate) -> Result<Client, ApiError> {
        self.patch(&["api", "clients", resource_id(id)?], update).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["api", "clients", resource_id(id)?]).await
    }

    // --- Тренеры ---

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, ApiError> {
        self.get(&["api", "trainers"]).await
    }

    pub async fn get_trainer(&self, id: &str) -> Result<Trainer, ApiError> {
        self.get(&["api", "trainers", resource_id(id)?]).await
    }

    pub async fn create_trainer(&self, trainer: &TrainerCreate) -> Result<Trainer, ApiError> {
        self.post(&["api", "trainers"], trainer).await
    }

    pub async fn delete_trainer(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["api", "trainers", resource_id(id)?]).await
    }

    // --- Платежи ---

    pub async fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, ApiError> {
        self.get_with(&["api", "payments"], filter).await
    }

    pub async fn create_payment(&self, payment: &PaymentCreate) -> Result<Payment, ApiError> {
        let created: Payment = self.post(&["api", "payments"], payment).await?;
        info!("Payment {} recorded: {} сум", created.public_id, created.total_amount);
        Ok(created)
    }

    // --- Каталог ---

    pub async fn list_services(&self, direction: Option<ServiceDirection>) -> Result<Vec<CatalogService>, ApiError> {
        match direction {
            Some(direction) => {
                self.get_with(&["api", "services"], &[("direction", direction.as_str())])
                    .await
            }
            None => self.get(&["api", "services"]).await,
        }
    }

    pub async fn list_coworking_places(&self) -> Result<Vec<CoworkingPlace>, ApiError> {
        self.get(&["api", "coworking-places"]).await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError> {
        self.post(&["api", "auth", "login"], credentials).await
    }
}
