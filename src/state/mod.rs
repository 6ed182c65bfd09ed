mod player;
mod room;
mod round;
mod vote;

use std::sync::Arc;

use crate::error::{GameError, GameResult};
use crate::lexicon::Lexicon;
use crate::rules::{roster, tally};
use crate::store::{MemoryStore, Store};
use crate::types::*;

/// Handle on the shared store plus the static inputs every room operation needs.
///
/// Holds no per-room state of its own: every operation re-reads what it needs
/// from the store, so any number of clones (one per client) can act on the
/// same room concurrently.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub lexicon: Arc<Lexicon>,
    pub config: GameConfig,
}

/// Result of creating or joining a room
#[derive(Debug, Clone)]
pub struct Joined {
    pub ctx: SessionContext,
    pub room: Room,
    pub player: Player,
}

/// Room, roster and current-ballot votes read together
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: Room,
    /// Roster order
    pub players: Vec<Player>,
    /// Only votes of `room.ballot`
    pub votes: Vec<Vote>,
}

impl RoomSnapshot {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn is_leader(&self, player_id: &str) -> bool {
        roster::is_leader(player_id, &self.players)
    }

    pub fn alive_players(&self) -> Vec<&Player> {
        roster::alive_players(&self.players)
    }

    pub fn voting_complete(&self) -> bool {
        self.room.phase.kind() == PhaseKind::Voting
            && tally::is_voting_complete(&self.votes, &self.players)
    }
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, lexicon: Lexicon, config: GameConfig) -> Self {
        Self {
            store,
            lexicon: Arc::new(lexicon),
            config,
        }
    }

    /// State backed by a fresh [`MemoryStore`]
    pub fn in_memory(lexicon: Lexicon) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            lexicon,
            GameConfig::default(),
        )
    }

    /// Re-read room, players and votes in full
    pub async fn snapshot(&self, room_id: &str) -> GameResult<RoomSnapshot> {
        let room = self.current_room(room_id).await?;

        let mut players = self.store.list_players(room_id).await?;
        roster::sort_roster(&mut players);

        let votes = self
            .store
            .list_votes(room_id)
            .await?
            .into_iter()
            .filter(|v| v.ballot == room.ballot)
            .collect();

        Ok(RoomSnapshot {
            room,
            players,
            votes,
        })
    }

    pub async fn snapshot_by_code(&self, code: RoomCode) -> GameResult<RoomSnapshot> {
        let room = self
            .store
            .find_room_by_code(code)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Room {}", code)))?;
        self.snapshot(&room.id).await
    }

    async fn current_room(&self, room_id: &str) -> GameResult<Room> {
        self.store
            .find_room(room_id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Room {}", room_id)))
    }

    /// Leader-only operations are refused for everybody else
    fn require_leader(
        snapshot: &RoomSnapshot,
        ctx: &SessionContext,
        action: &str,
    ) -> GameResult<()> {
        if snapshot.is_leader(&ctx.player_id) {
            Ok(())
        } else {
            Err(GameError::IllegalTransition(format!(
                "only the host can {}",
                action
            )))
        }
    }
}
