use axum::{routing::get, Router};

use crate::state::AppState;

mod callback;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/callback", get(callback::callback))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
