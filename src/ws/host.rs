//! Leader intents
//!
//! Whether the caller is the leader is decided by the room operations from
//! the current roster, not by anything stored on the connection.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::SessionContext;
use std::sync::Arc;

use super::handlers::reply;

pub async fn handle_start_round(
    state: &Arc<AppState>,
    ctx: &SessionContext,
    categories: Vec<String>,
    impostor_count: Option<u32>,
) -> Option<ServerMessage> {
    tracing::debug!(
        room_code = ctx.room_code,
        ?categories,
        ?impostor_count,
        "Start round requested"
    );
    reply(state.start_round(ctx, &categories, impostor_count).await)
}

pub async fn handle_open_voting(
    state: &Arc<AppState>,
    ctx: &SessionContext,
) -> Option<ServerMessage> {
    reply(state.open_voting(ctx).await)
}

pub async fn handle_finalize_voting(
    state: &Arc<AppState>,
    ctx: &SessionContext,
) -> Option<ServerMessage> {
    reply(state.finalize_voting(ctx).await)
}

pub async fn handle_continue_round(
    state: &Arc<AppState>,
    ctx: &SessionContext,
) -> Option<ServerMessage> {
    reply(state.continue_round(ctx).await)
}

pub async fn handle_reset_to_lobby(
    state: &Arc<AppState>,
    ctx: &SessionContext,
) -> Option<ServerMessage> {
    reply(state.reset_to_lobby(ctx).await)
}
