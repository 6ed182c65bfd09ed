//! WebSocket message dispatch
//!
//! Intents that act on a room need a session first; the check happens here
//! before dispatching to the player or host handler modules. Leadership is
//! not checked here: the room operations decide that from the roster.

use crate::error::GameResult;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::{host, player, Session};

/// Macro to pull the session context out or return early with NO_SESSION
macro_rules! require_session {
    ($session:expr) => {
        match $session.ctx() {
            Some(ctx) => ctx.clone(),
            None => {
                return Some(ServerMessage::error(
                    "NO_SESSION",
                    "Create or join a room first",
                ))
            }
        }
    };
}

/// Successful transitions reply with nothing; the sync loop delivers the result
pub(super) fn reply<T>(result: GameResult<T>) -> Option<ServerMessage> {
    match result {
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(code = e.code(), "Rejected intent: {}", e);
            Some(e.into())
        }
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Session setup
        ClientMessage::CreateRoom { name } => {
            player::handle_create_room(state, session, name).await
        }

        ClientMessage::JoinRoom { code, name } => {
            player::handle_join_room(state, session, code, name).await
        }

        ClientMessage::Resync => {
            let ctx = require_session!(session);
            player::handle_resync(state, &ctx).await
        }

        ClientMessage::CastVote { target_id } => {
            let ctx = require_session!(session);
            player::handle_cast_vote(state, &ctx, target_id).await
        }

        // Leader intents
        ClientMessage::StartRound {
            categories,
            impostor_count,
        } => {
            let ctx = require_session!(session);
            host::handle_start_round(state, &ctx, categories, impostor_count).await
        }

        ClientMessage::OpenVoting => {
            let ctx = require_session!(session);
            host::handle_open_voting(state, &ctx).await
        }

        ClientMessage::FinalizeVoting => {
            let ctx = require_session!(session);
            host::handle_finalize_voting(state, &ctx).await
        }

        ClientMessage::ContinueRound => {
            let ctx = require_session!(session);
            host::handle_continue_round(state, &ctx).await
        }

        ClientMessage::ResetToLobby => {
            let ctx = require_session!(session);
            host::handle_reset_to_lobby(state, &ctx).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::lexicon;
    use crate::types::*;
    use tokio::sync::mpsc;

    fn setup() -> (Arc<AppState>, Session) {
        let (tx, _rx) = mpsc::unbounded_channel();
        (Arc::new(AppState::in_memory(lexicon())), Session::new(tx))
    }

    fn expect_error(result: Option<ServerMessage>, expected: &str) {
        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, expected),
            other => panic!("Expected {} error, got {:?}", expected, other),
        }
    }

    #[tokio::test]
    async fn test_intent_without_session() {
        let (state, mut session) = setup();

        let result = handle_message(ClientMessage::OpenVoting, &mut session, &state).await;
        expect_error(result, "NO_SESSION");

        let result = handle_message(
            ClientMessage::CastVote {
                target_id: "p1".to_string(),
            },
            &mut session,
            &state,
        )
        .await;
        expect_error(result, "NO_SESSION");
    }

    #[tokio::test]
    async fn test_create_room_replies_joined() {
        let (state, mut session) = setup();

        let result = handle_message(
            ClientMessage::CreateRoom {
                name: "Ana".to_string(),
            },
            &mut session,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Joined {
                room_id,
                room_code,
                player_id,
            }) => {
                let ctx = session.ctx().unwrap();
                assert_eq!(ctx.room_id, room_id);
                assert_eq!(ctx.room_code, room_code);
                assert_eq!(ctx.player_id, player_id);
            }
            other => panic!("Expected Joined, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        let (state, mut session) = setup();

        let result = handle_message(
            ClientMessage::JoinRoom {
                code: "10000".to_string(),
                name: "Beto".to_string(),
            },
            &mut session,
            &state,
        )
        .await;
        expect_error(result, "NOT_FOUND");
        assert!(session.ctx().is_none());
    }

    #[tokio::test]
    async fn test_non_leader_intent_rejected() {
        let (state, mut host) = setup();
        handle_message(
            ClientMessage::CreateRoom {
                name: "Ana".to_string(),
            },
            &mut host,
            &state,
        )
        .await;
        let code = host.ctx().unwrap().room_code.to_string();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut guest = Session::new(tx);
        handle_message(
            ClientMessage::JoinRoom {
                code,
                name: "Beto".to_string(),
            },
            &mut guest,
            &state,
        )
        .await;

        let result = handle_message(
            ClientMessage::StartRound {
                categories: vec!["Nombres".to_string()],
                impostor_count: Some(1),
            },
            &mut guest,
            &state,
        )
        .await;
        expect_error(result, "ILLEGAL_TRANSITION");
    }

    #[tokio::test]
    async fn test_successful_transition_is_silent() {
        let (state, mut host) = setup();
        handle_message(
            ClientMessage::CreateRoom {
                name: "Ana".to_string(),
            },
            &mut host,
            &state,
        )
        .await;
        let code = host.ctx().unwrap().room_code.to_string();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut guest = Session::new(tx);
        handle_message(
            ClientMessage::JoinRoom {
                code,
                name: "Beto".to_string(),
            },
            &mut guest,
            &state,
        )
        .await;

        let result = handle_message(
            ClientMessage::StartRound {
                categories: vec!["Nombres".to_string()],
                impostor_count: None,
            },
            &mut host,
            &state,
        )
        .await;
        assert!(result.is_none());

        let room_id = host.ctx().unwrap().room_id.clone();
        let snapshot = state.snapshot(&room_id).await.unwrap();
        assert_eq!(snapshot.room.phase.kind(), PhaseKind::Active);
    }

    #[tokio::test]
    async fn test_resync_returns_view() {
        let (state, mut session) = setup();
        handle_message(
            ClientMessage::CreateRoom {
                name: "Ana".to_string(),
            },
            &mut session,
            &state,
        )
        .await;

        match handle_message(ClientMessage::Resync, &mut session, &state).await {
            Some(ServerMessage::View { view }) => {
                assert_eq!(view.phase, PhaseKind::Lobby);
                assert!(view.is_leader);
            }
            other => panic!("Expected View, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_start_round_input() {
        let (state, mut session) = setup();
        handle_message(
            ClientMessage::CreateRoom {
                name: "Ana".to_string(),
            },
            &mut session,
            &state,
        )
        .await;

        let result = handle_message(
            ClientMessage::StartRound {
                categories: vec![],
                impostor_count: None,
            },
            &mut session,
            &state,
        )
        .await;
        expect_error(result, "INVALID_INPUT");
    }
}
