// Public API for integration tests and the server binary

pub mod api;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod protocol;
pub mod rules;
pub mod state;
pub mod store;
pub mod sync;
pub mod types;
pub mod view;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// HTTP + WebSocket routes with the standard middleware stack
pub fn router(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/categories", get(api::list_categories))
        .route("/api/rooms/{code}", get(api::get_room))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
