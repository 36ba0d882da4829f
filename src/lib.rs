pub mod config;
pub mod controllers;
pub mod crm_client;
pub mod drawer;
pub mod error;
pub mod grid;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::crm_client::{ApiError, CrmClient};
use crate::services::BoardService;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub board: BoardService,
}

impl AppState {
    pub fn new(config: &config::Config) -> Result<Arc<Self>, ApiError> {
        let crm = CrmClient::from_config(&config.crm, &config.circuit_breaker)?;
        let board = BoardService::new(crm, &config.board);
        Ok(Arc::new(Self { board }))
    }
}

/// Корневой роутер сервиса.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "EYWA Board API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
