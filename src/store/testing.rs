//! Store wrapper that injects races and failures into a [`MemoryStore`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::*;

#[derive(Default)]
pub struct ScriptedStore {
    pub inner: MemoryStore,
    failing_room_reads: AtomicUsize,
    insert_before_lobby_claim: Mutex<Option<Player>>,
    phase_before_next_insert: Mutex<Option<RoomPhase>>,
    patch_after_lobby_claim: Mutex<Option<RoomPatch>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` calls to `find_room` fail
    pub fn fail_room_reads(&self, n: usize) {
        self.failing_room_reads.store(n, Ordering::SeqCst);
    }

    pub fn pending_failures(&self) -> usize {
        self.failing_room_reads.load(Ordering::SeqCst)
    }

    /// Insert `player` right before the next guarded claim out of Lobby
    pub fn insert_before_lobby_claim(&self, player: Player) {
        *self.insert_before_lobby_claim.lock().unwrap() = Some(player);
    }

    /// Apply `patch` right after the next guarded claim out of Lobby succeeds
    pub fn patch_after_lobby_claim(&self, patch: RoomPatch) {
        *self.patch_after_lobby_claim.lock().unwrap() = Some(patch);
    }

    /// Move the room to `phase` right before the next player insert lands
    pub fn set_phase_before_next_insert(&self, phase: RoomPhase) {
        *self.phase_before_next_insert.lock().unwrap() = Some(phase);
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn insert_room(&self, room: Room) -> StoreResult<Room> {
        self.inner.insert_room(room).await
    }

    async fn find_room(&self, room_id: &str) -> StoreResult<Option<Room>> {
        let failing = self
            .failing_room_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("scripted failure".to_string()));
        }
        self.inner.find_room(room_id).await
    }

    async fn find_room_by_code(&self, code: RoomCode) -> StoreResult<Option<Room>> {
        self.inner.find_room_by_code(code).await
    }

    async fn update_room(
        &self,
        room_id: &str,
        guard: Option<PhaseKind>,
        patch: RoomPatch,
    ) -> StoreResult<bool> {
        if guard != Some(PhaseKind::Lobby) {
            return self.inner.update_room(room_id, guard, patch).await;
        }

        let late = self.insert_before_lobby_claim.lock().unwrap().take();
        if let Some(player) = late {
            self.inner.insert_player(player).await?;
        }
        let claimed = self.inner.update_room(room_id, guard, patch).await?;
        let after = self.patch_after_lobby_claim.lock().unwrap().take();
        if let (true, Some(after)) = (claimed, after) {
            self.inner.update_room(room_id, None, after).await?;
        }
        Ok(claimed)
    }

    async fn insert_player(&self, player: Player) -> StoreResult<Player> {
        let phase = self.phase_before_next_insert.lock().unwrap().take();
        if let Some(phase) = phase {
            self.inner
                .update_room(&player.room_id, None, RoomPatch::phase(phase))
                .await?;
        }
        self.inner.insert_player(player).await
    }

    async fn list_players(&self, room_id: &str) -> StoreResult<Vec<Player>> {
        self.inner.list_players(room_id).await
    }

    async fn update_player(&self, player_id: &str, patch: PlayerPatch) -> StoreResult<()> {
        self.inner.update_player(player_id, patch).await
    }

    async fn update_players(&self, room_id: &str, patch: PlayerPatch) -> StoreResult<()> {
        self.inner.update_players(room_id, patch).await
    }

    async fn insert_vote(&self, vote: Vote) -> StoreResult<Vote> {
        self.inner.insert_vote(vote).await
    }

    async fn list_votes(&self, room_id: &str) -> StoreResult<Vec<Vote>> {
        self.inner.list_votes(room_id).await
    }

    async fn delete_stale_votes(&self, room_id: &str, current_ballot: u32) -> StoreResult<()> {
        self.inner.delete_stale_votes(room_id, current_ballot).await
    }

    async fn subscribe(&self, room_id: &str) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        self.inner.subscribe(room_id).await
    }
}
