//! Read-only HTTP endpoints.
//!
//! Lobby screens use these to list categories and check a room code before
//! opening a WebSocket.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GameError;
use crate::lexicon::CategoryInfo;
use crate::state::AppState;
use crate::types::*;

/// Public summary of a room. Never includes the word or roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub phase: PhaseKind,
    pub round_no: u32,
    pub player_count: usize,
    pub alive_count: usize,
}

/// List word categories.
///
/// GET /api/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryInfo>> {
    Json(state.lexicon.categories())
}

/// Look up a room by code.
///
/// GET /api/rooms/{code}
pub async fn get_room(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    let code = match code.parse::<RoomCode>() {
        Ok(code) => code,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid room code").into_response(),
    };

    match state.snapshot_by_code(code).await {
        Ok(snapshot) => Json(RoomSummary {
            code: snapshot.room.code,
            phase: snapshot.room.phase.kind(),
            round_no: snapshot.room.round_no,
            player_count: snapshot.players.len(),
            alive_count: snapshot.alive_players().len(),
        })
        .into_response(),
        Err(GameError::NotFound(what)) => {
            (StatusCode::NOT_FOUND, format!("{} not found", what)).into_response()
        }
        Err(e) => {
            tracing::error!("Room lookup failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
