use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::BearerToken;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients/search", get(search_clients))
        .route("/trainers", get(list_trainers))
}

#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    pub query: Option<String>,
}

// GET /api/clients/search
async fn search_clients(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Query(params): Query<ClientSearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let clients = state.board.for_token(token).search_clients(params.query).await?;
    Ok(Json(clients))
}

// GET /api/trainers
async fn list_trainers(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let trainers = state.board.for_token(token).trainers().await?;
    Ok(Json(trainers))
}
