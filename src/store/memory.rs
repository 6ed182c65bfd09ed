use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use super::*;

/// Capacity of each room's change channel. Slow subscribers see `Lagged`,
/// which they treat as "something changed" anyway.
const CHANNEL_CAPACITY: usize = 64;

/// In-memory store shared by every connection of one server process
#[derive(Clone)]
pub struct MemoryStore {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    votes: Arc<RwLock<HashMap<VoteId, Vote>>>,
    channels: Arc<RwLock<HashMap<RoomId, broadcast::Sender<ChangeEvent>>>>,
    last_stamp: Arc<Mutex<DateTime<Utc>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(HashMap::new())),
            channels: Arc::new(RwLock::new(HashMap::new())),
            last_stamp: Arc::new(Mutex::new(DateTime::<Utc>::MIN_UTC)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Insert timestamp, strictly increasing across the whole store
    async fn stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().await;
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        next
    }

    async fn notify(&self, room_id: &str, relation: Relation) {
        if let Some(tx) = self.channels.read().await.get(room_id) {
            // No subscribers is fine
            let _ = tx.send(ChangeEvent {
                room_id: room_id.to_string(),
                relation,
            });
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_player_patch(player: &mut Player, patch: &PlayerPatch) {
    if let Some(alive) = patch.alive {
        player.alive = alive;
    }
    if let Some(role) = patch.role {
        player.role = role;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_room(&self, mut room: Room) -> StoreResult<Room> {
        self.check_online()?;
        room.created_at = self.stamp().await;

        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) {
            return Err(StoreError::Conflict(format!("room {}", room.id)));
        }
        rooms.insert(room.id.clone(), room.clone());
        drop(rooms);

        self.notify(&room.id, Relation::Rooms).await;
        Ok(room)
    }

    async fn find_room(&self, room_id: &str) -> StoreResult<Option<Room>> {
        self.check_online()?;
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn find_room_by_code(&self, code: RoomCode) -> StoreResult<Option<Room>> {
        self.check_online()?;
        // Codes are not unique; the newest room wins
        Ok(self
            .rooms
            .read()
            .await
            .values()
            .filter(|r| r.code == code)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update_room(
        &self,
        room_id: &str,
        guard: Option<PhaseKind>,
        patch: RoomPatch,
    ) -> StoreResult<bool> {
        self.check_online()?;
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return Ok(false);
        };

        if let Some(expected) = guard {
            if room.phase.kind() != expected {
                return Ok(false);
            }
        }

        if let Some(phase) = patch.phase {
            room.phase = phase;
        }
        if let Some(count) = patch.impostor_count {
            room.impostor_count = count;
        }
        if let Some(round_no) = patch.round_no {
            room.round_no = round_no;
        }
        if let Some(ballot) = patch.ballot {
            room.ballot = ballot;
        }
        drop(rooms);

        self.notify(room_id, Relation::Rooms).await;
        Ok(true)
    }

    async fn insert_player(&self, mut player: Player) -> StoreResult<Player> {
        self.check_online()?;
        player.created_at = self.stamp().await;

        let mut players = self.players.write().await;
        if players.contains_key(&player.id) {
            return Err(StoreError::Conflict(format!("player {}", player.id)));
        }
        players.insert(player.id.clone(), player.clone());
        drop(players);

        self.notify(&player.room_id, Relation::Players).await;
        Ok(player)
    }

    async fn list_players(&self, room_id: &str) -> StoreResult<Vec<Player>> {
        self.check_online()?;
        Ok(self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn update_player(&self, player_id: &str, patch: PlayerPatch) -> StoreResult<()> {
        self.check_online()?;
        let mut players = self.players.write().await;
        let room_id = match players.get_mut(player_id) {
            Some(player) => {
                apply_player_patch(player, &patch);
                player.room_id.clone()
            }
            None => return Ok(()),
        };
        drop(players);

        self.notify(&room_id, Relation::Players).await;
        Ok(())
    }

    async fn update_players(&self, room_id: &str, patch: PlayerPatch) -> StoreResult<()> {
        self.check_online()?;
        let mut players = self.players.write().await;
        for player in players.values_mut().filter(|p| p.room_id == room_id) {
            apply_player_patch(player, &patch);
        }
        drop(players);

        self.notify(room_id, Relation::Players).await;
        Ok(())
    }

    async fn insert_vote(&self, mut vote: Vote) -> StoreResult<Vote> {
        self.check_online()?;
        vote.created_at = self.stamp().await;

        let mut votes = self.votes.write().await;
        if votes.contains_key(&vote.id) {
            return Err(StoreError::Conflict(format!("vote {}", vote.id)));
        }
        votes.insert(vote.id.clone(), vote.clone());
        drop(votes);

        self.notify(&vote.room_id, Relation::Votes).await;
        Ok(vote)
    }

    async fn list_votes(&self, room_id: &str) -> StoreResult<Vec<Vote>> {
        self.check_online()?;
        Ok(self
            .votes
            .read()
            .await
            .values()
            .filter(|v| v.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn delete_stale_votes(&self, room_id: &str, current_ballot: u32) -> StoreResult<()> {
        self.check_online()?;
        let mut votes = self.votes.write().await;
        let before = votes.len();
        votes.retain(|_, v| v.room_id != room_id || v.ballot == current_ballot);
        let removed = before - votes.len();
        drop(votes);

        if removed > 0 {
            tracing::debug!(room_id, removed, "Deleted stale votes");
            self.notify(room_id, Relation::Votes).await;
        }
        Ok(())
    }

    async fn subscribe(&self, room_id: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        self.check_online()?;
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(tx.subscribe())
    }
}
