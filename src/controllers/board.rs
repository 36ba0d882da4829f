use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::drawer::DrawerAction;
use crate::grid::view::BoardFilter;
use crate::grid::SlotKey;
use crate::middleware::BearerToken;
use crate::models::EventStatus;
use crate::services::ViewKind;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/overview/move", post(move_overview))
        .route("/overview/resize", post(resize_overview))
        .route("/schedule", get(get_schedule))
        .route("/schedule/move", post(move_schedule))
        .route("/board/actions", post(apply_action))
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<EventStatus>,
    pub query: Option<String>,
}

impl BoardQuery {
    fn filter(&self) -> BoardFilter {
        BoardFilter {
            status: self.status,
            query: self.query.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub date: Option<NaiveDate>,
    pub source: SlotKey,
    pub target: SlotKey,
}

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub date: Option<NaiveDate>,
    pub slot: SlotKey,
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub view: ViewKind,
    pub action: DrawerAction,
}

// GET /api/overview
async fn get_overview(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Query(params): Query<BoardQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state.board.for_token(token);
    let date = params.date.unwrap_or_else(|| board.today());
    let view = board.overview(date, &params.filter()).await?;
    Ok(Json(view))
}

// GET /api/schedule
async fn get_schedule(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Query(params): Query<BoardQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state.board.for_token(token);
    let date = params.date.unwrap_or_else(|| board.today());
    let view = board.schedule(date, &params.filter()).await?;
    Ok(Json(view))
}

// POST /api/overview/move
async fn move_overview(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state.board.for_token(token);
    let date = req.date.unwrap_or_else(|| board.today());
    let view = board.move_overview(date, &req.source, &req.target).await?;
    Ok(Json(view))
}

// POST /api/overview/resize
async fn resize_overview(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Json(req): Json<ResizeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.delta == 0 {
        return Err((StatusCode::BAD_REQUEST, "delta должен быть отличен от нуля".to_string()));
    }
    let board = state.board.for_token(token);
    let date = req.date.unwrap_or_else(|| board.today());
    let view = board.resize_overview(date, &req.slot, req.delta).await?;
    Ok(Json(view))
}

// POST /api/schedule/move
async fn move_schedule(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Json(req): Json<MoveRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state.board.for_token(token);
    let date = req.date.unwrap_or_else(|| board.today());
    let view = board.move_week(date, &req.source, &req.target).await?;
    Ok(Json(view))
}

// POST /api/board/actions
async fn apply_action(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Json(req): Json<ActionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let board = state.board.for_token(token);
    let date = req.date.unwrap_or_else(|| board.today());
    let view = board.apply(date, req.view, req.action).await?;
    Ok(Json(view))
}
