pub mod board;
pub mod directory;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(board::routes())
        .merge(directory::routes())
}
