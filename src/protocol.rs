use crate::error::GameError;
use crate::lexicon::CategoryInfo;
use crate::types::*;
use crate::view::ClientView;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        name: String,
    },
    JoinRoom {
        code: String,
        name: String,
    },
    // Leader-only intents
    StartRound {
        categories: Vec<String>,
        #[serde(default)]
        impostor_count: Option<u32>,
    },
    OpenVoting,
    ContinueRound,
    ResetToLobby,
    /// Ask the leader's client to close a complete ballot right away
    FinalizeVoting,
    CastVote {
        target_id: PlayerId,
    },
    /// Request a fresh view without waiting for a change
    Resync,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        categories: Vec<CategoryInfo>,
        server_now: String,
    },
    /// Sent once the connection has a session
    Joined {
        room_id: RoomId,
        room_code: RoomCode,
        player_id: PlayerId,
    },
    View {
        view: ClientView,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

impl From<GameError> for ServerMessage {
    fn from(e: GameError) -> Self {
        ServerMessage::error(e.code(), e.to_string())
    }
}

impl From<&SessionContext> for ServerMessage {
    fn from(ctx: &SessionContext) -> Self {
        ServerMessage::Joined {
            room_id: ctx.room_id.clone(),
            room_code: ctx.room_code,
            player_id: ctx.player_id.clone(),
        }
    }
}
