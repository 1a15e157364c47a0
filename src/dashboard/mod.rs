mod msg;
mod page;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use msg::{send_prompt, Exchange};

/// Mounted under `/dashboard`, behind the signed-in guard.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::dashboard).post(page::send))
        .route("/ws", get(ws::dashboard_ws))
}
