//! Handlers any player may invoke

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::sync::SyncLoop;
use crate::types::*;
use std::sync::Arc;

use super::handlers::reply;
use super::Session;

pub async fn handle_create_room(
    state: &Arc<AppState>,
    session: &mut Session,
    name: String,
) -> Option<ServerMessage> {
    match state.create_room(&name).await {
        Ok(joined) => {
            let msg = ServerMessage::from(&joined.ctx);
            session.attach(state, joined.ctx);
            Some(msg)
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_join_room(
    state: &Arc<AppState>,
    session: &mut Session,
    code: String,
    name: String,
) -> Option<ServerMessage> {
    match state.join_room(&code, &name).await {
        Ok(joined) => {
            let msg = ServerMessage::from(&joined.ctx);
            session.attach(state, joined.ctx);
            Some(msg)
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_cast_vote(
    state: &Arc<AppState>,
    ctx: &SessionContext,
    target_id: PlayerId,
) -> Option<ServerMessage> {
    reply(state.cast_vote(ctx, &target_id).await)
}

pub async fn handle_resync(state: &Arc<AppState>, ctx: &SessionContext) -> Option<ServerMessage> {
    match SyncLoop::new(state.clone(), ctx.clone()).refresh().await {
        Ok(view) => Some(ServerMessage::View { view }),
        Err(e) => Some(e.into()),
    }
}
