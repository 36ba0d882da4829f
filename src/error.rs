//! Ошибки операций над доской и их отображение в HTTP-ответы.

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use crate::crm_client::ApiError;
use crate::grid::SlotError;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("Некорректные данные формы: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Некорректный запрос: {0}")]
    BadRequest(String),
    #[error("Запись не найдена: {0}")]
    NotFound(String),
    #[error("Действие недоступно: {0}")]
    InvalidState(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BoardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoardError::Slot(_) => StatusCode::CONFLICT,
            BoardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::BadRequest(_)
            | BoardError::InvalidState(_)
            | BoardError::Api(ApiError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            BoardError::NotFound(_) | BoardError::Api(ApiError::NotFound) => StatusCode::NOT_FOUND,
            BoardError::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            BoardError::Api(ApiError::CircuitOpen) => StatusCode::SERVICE_UNAVAILABLE,
            BoardError::Api(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Превращает ошибку в пару для ответа обработчика.
/// Ошибки upstream логируются полностью, клиенту уходит короткое сообщение.
impl From<BoardError> for (StatusCode, String) {
    fn from(err: BoardError) -> Self {
        let status = err.status_code();
        match &err {
            BoardError::Api(ApiError::NotFound) => (status, "Запись не найдена".to_string()),
            BoardError::Api(ApiError::Unauthorized) => (status, "Требуется авторизация".to_string()),
            BoardError::Api(ApiError::InvalidId(id)) => {
                warn!("Rejected resource id {:?}", id);
                (status, "Некорректный идентификатор записи".to_string())
            }
            BoardError::Api(api) => {
                error!("CRM API request failed: {}", api);
                (status, "Не удалось выполнить запрос к CRM".to_string())
            }
            other => {
                warn!("Board operation rejected: {}", other);
                (status, other.to_string())
            }
        }
    }
}
