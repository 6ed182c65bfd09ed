//! Shared state store interface
//!
//! Rooms, players and votes live in a store shared by every client. The core
//! only talks to it through [`Store`], so the backing implementation can be the
//! in-memory [`MemoryStore`] or anything that speaks the same operations.
//! No call here is assumed to be atomic with any other call.

mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::*;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Conflicting record: {0}")]
    Conflict(String),
}

/// The three relations a room is made of
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Rooms,
    Players,
    Votes,
}

/// "Something changed in this room, re-fetch". Carries no record data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub room_id: RoomId,
    pub relation: Relation,
}

/// Partial update for a room. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub phase: Option<RoomPhase>,
    pub impostor_count: Option<u32>,
    pub round_no: Option<u32>,
    pub ballot: Option<u32>,
}

impl RoomPatch {
    pub fn phase(phase: RoomPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Default::default()
        }
    }
}

/// Partial update for one or more players
#[derive(Debug, Clone, Default)]
pub struct PlayerPatch {
    pub alive: Option<bool>,
    /// `Some(None)` clears the role
    pub role: Option<Option<Role>>,
}

impl PlayerPatch {
    pub fn eliminated() -> Self {
        Self {
            alive: Some(false),
            role: None,
        }
    }

    pub fn dealt(role: Role) -> Self {
        Self {
            alive: Some(true),
            role: Some(Some(role)),
        }
    }

    pub fn cleared() -> Self {
        Self {
            alive: Some(true),
            role: Some(None),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a room. The store assigns `created_at`.
    async fn insert_room(&self, room: Room) -> StoreResult<Room>;

    async fn find_room(&self, room_id: &str) -> StoreResult<Option<Room>>;

    async fn find_room_by_code(&self, code: RoomCode) -> StoreResult<Option<Room>>;

    /// Apply a patch to a room. With a `guard`, the patch is applied only if the
    /// stored phase is still of that kind. Returns whether anything was written.
    async fn update_room(
        &self,
        room_id: &str,
        guard: Option<PhaseKind>,
        patch: RoomPatch,
    ) -> StoreResult<bool>;

    /// Insert a player. The store assigns `created_at`.
    async fn insert_player(&self, player: Player) -> StoreResult<Player>;

    async fn list_players(&self, room_id: &str) -> StoreResult<Vec<Player>>;

    async fn update_player(&self, player_id: &str, patch: PlayerPatch) -> StoreResult<()>;

    /// Apply the same patch to every player of a room
    async fn update_players(&self, room_id: &str, patch: PlayerPatch) -> StoreResult<()>;

    /// Insert a vote. The store assigns `created_at`.
    async fn insert_vote(&self, vote: Vote) -> StoreResult<Vote>;

    async fn list_votes(&self, room_id: &str) -> StoreResult<Vec<Vote>>;

    /// Delete every vote of the room that does not belong to `current_ballot`
    async fn delete_stale_votes(&self, room_id: &str, current_ballot: u32) -> StoreResult<()>;

    /// Change notifications for one room
    async fn subscribe(&self, room_id: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>>;
}
