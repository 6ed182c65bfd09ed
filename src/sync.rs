//! Per-client synchronization loop.
//!
//! Each connected client runs its own loop: wait for any change in the room,
//! re-read the whole room and render a fresh view. Clients never apply deltas,
//! so every client converges on the latest stored state no matter how many
//! notifications it missed.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, broadcast::error::TryRecvError, mpsc};
use tokio::task::JoinHandle;

use crate::error::GameResult;
use crate::state::{AppState, RoomSnapshot};
use crate::types::*;
use crate::view::ClientView;

/// Where views end up
#[async_trait]
pub trait Renderer: Send {
    /// Returns `false` once nobody is listening anymore
    async fn render(&mut self, view: ClientView) -> bool;
}

#[async_trait]
impl Renderer for mpsc::Sender<ClientView> {
    async fn render(&mut self, view: ClientView) -> bool {
        self.send(view).await.is_ok()
    }
}

#[async_trait]
impl Renderer for mpsc::UnboundedSender<ClientView> {
    async fn render(&mut self, view: ClientView) -> bool {
        self.send(view).is_ok()
    }
}

pub struct SyncLoop {
    state: Arc<AppState>,
    ctx: SessionContext,
}

impl SyncLoop {
    pub fn new(state: Arc<AppState>, ctx: SessionContext) -> Self {
        Self { state, ctx }
    }

    /// Re-read the room, run leader duties if this client is the leader, and
    /// derive the view
    pub async fn refresh(&self) -> GameResult<ClientView> {
        let mut snapshot = self.state.snapshot(&self.ctx.room_id).await?;

        if snapshot.is_leader(&self.ctx.player_id) && self.leader_duties(&snapshot).await? {
            snapshot = self.state.snapshot(&self.ctx.room_id).await?;
        }

        Ok(ClientView::derive(&snapshot, &self.ctx.player_id))
    }

    /// Work only the leader does on every refresh. Returns whether anything was written.
    async fn leader_duties(&self, snapshot: &RoomSnapshot) -> GameResult<bool> {
        match snapshot.room.phase.kind() {
            PhaseKind::Voting => self.state.close_ballot(snapshot).await,
            PhaseKind::ResolvedInterim | PhaseKind::ResolvedFinal => {
                self.state.repair_elimination(snapshot).await
            }
            PhaseKind::Lobby | PhaseKind::Active => Ok(false),
        }
    }

    /// Render until the renderer goes away or the room's change feed closes
    pub async fn run<R: Renderer>(self, mut renderer: R) -> GameResult<()> {
        // Subscribe before the first read so no change slips between the two
        let mut changes = self.state.store.subscribe(&self.ctx.room_id).await?;
        let mut last: Option<ClientView> = None;

        loop {
            match self.refresh().await {
                Ok(view) => {
                    if last.as_ref() != Some(&view) {
                        if !renderer.render(view.clone()).await {
                            tracing::debug!(player_id = %self.ctx.player_id, "Renderer closed");
                            break;
                        }
                        last = Some(view);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        room_code = self.ctx.room_code,
                        error = %e,
                        "Refresh failed, retrying on next change"
                    );
                }
            }

            match changes.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change feed lagged, refreshing anyway");
                }
                Err(RecvError::Closed) => break,
            }

            // A full re-read covers any changes already queued
            while let Ok(_) | Err(TryRecvError::Lagged(_)) = changes.try_recv() {}
        }

        Ok(())
    }

    pub fn spawn<R: Renderer + 'static>(self, renderer: R) -> JoinHandle<()> {
        tokio::spawn(async move {
            let player_id = self.ctx.player_id.clone();
            if let Err(e) = self.run(renderer).await {
                tracing::warn!(player_id = %player_id, error = %e, "Sync loop stopped");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{dealt_round, lexicon, lobby, names};
    use crate::store::testing::ScriptedStore;
    use crate::store::{PlayerPatch, RoomPatch, Store};
    use std::time::Duration;

    /// Receive views until one matches
    async fn wait_for(
        rx: &mut mpsc::Receiver<ClientView>,
        pred: impl Fn(&ClientView) -> bool,
    ) -> ClientView {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let view = rx.recv().await.expect("sync loop ended");
                if pred(&view) {
                    return view;
                }
            }
        })
        .await
        .expect("timed out waiting for view")
    }

    fn start_loop(state: &AppState, ctx: &SessionContext) -> mpsc::Receiver<ClientView> {
        let (tx, rx) = mpsc::channel(32);
        SyncLoop::new(Arc::new(state.clone()), ctx.clone()).spawn(tx);
        rx
    }

    #[tokio::test]
    async fn test_initial_view_rendered() {
        let (state, ctxs) = lobby(2).await;
        let mut rx = start_loop(&state, &ctxs[1]);

        let view = wait_for(&mut rx, |_| true).await;
        assert_eq!(view.phase, PhaseKind::Lobby);
        assert_eq!(view.roster.len(), 2);
        assert!(!view.is_leader);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_retried_on_next_change() {
        let store = Arc::new(ScriptedStore::new());
        let state = AppState::new(store.clone(), lexicon(), GameConfig::default());
        let host = state.create_room("Ana").await.unwrap();

        let (tx, mut rx) = mpsc::channel(32);
        let handle = SyncLoop::new(Arc::new(state.clone()), host.ctx.clone()).spawn(tx);
        let view = wait_for(&mut rx, |_| true).await;
        assert_eq!(view.roster.len(), 1);

        store.fail_room_reads(1);
        store
            .inner
            .update_players(&host.ctx.room_id, PlayerPatch::cleared())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.pending_failures() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("refresh never reached the store");

        state
            .join_room(&host.ctx.room_code.to_string(), "Beto")
            .await
            .unwrap();
        let view = wait_for(&mut rx, |v| v.roster.len() == 2).await;
        assert_eq!(view.phase, PhaseKind::Lobby);
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn test_clients_converge_on_round_start() {
        let (state, ctxs) = lobby(3).await;
        let mut host_rx = start_loop(&state, &ctxs[0]);
        let mut guest_rx = start_loop(&state, &ctxs[1]);

        state.start_round(&ctxs[0], &names(), Some(1)).await.unwrap();

        let host = wait_for(&mut host_rx, |v| v.phase == PhaseKind::Active).await;
        let guest = wait_for(&mut guest_rx, |v| v.phase == PhaseKind::Active).await;
        assert_eq!(host.round_no, guest.round_no);
        assert!(host.me.unwrap().role.is_some());
        assert!(guest.me.unwrap().role.is_some());
    }

    #[tokio::test]
    async fn test_leader_auto_finalizes_once() {
        let (state, ctxs) = dealt_round(4, &[3]).await;
        state.open_voting(&ctxs[0]).await.unwrap();

        let mut receivers: Vec<_> = ctxs.iter().map(|c| start_loop(&state, c)).collect();

        for ctx in &ctxs {
            state.cast_vote(ctx, &ctxs[3].player_id).await.unwrap();
        }

        for rx in receivers.iter_mut() {
            let view = wait_for(rx, |v| v.phase == PhaseKind::ResolvedFinal).await;
            assert!(view.result_text.unwrap().contains("citizens win"));
        }

        let snapshot = state.snapshot(&ctxs[0].room_id).await.unwrap();
        let dead: Vec<_> = snapshot.players.iter().filter(|p| !p.alive).collect();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, ctxs[3].player_id);
    }

    #[tokio::test]
    async fn test_non_leader_refresh_does_not_finalize() {
        let (state, ctxs) = dealt_round(3, &[2]).await;
        state.open_voting(&ctxs[0]).await.unwrap();
        for ctx in &ctxs {
            state.cast_vote(ctx, &ctxs[2].player_id).await.unwrap();
        }

        let guest = SyncLoop::new(Arc::new(state.clone()), ctxs[1].clone());
        let view = guest.refresh().await.unwrap();
        assert_eq!(view.phase, PhaseKind::Voting);

        let host = SyncLoop::new(Arc::new(state.clone()), ctxs[0].clone());
        let view = host.refresh().await.unwrap();
        assert_eq!(view.phase, PhaseKind::ResolvedFinal);
    }

    #[tokio::test]
    async fn test_leader_repairs_missing_elimination() {
        let (state, ctxs) = dealt_round(5, &[4]).await;
        state.open_voting(&ctxs[0]).await.unwrap();
        for ctx in &ctxs {
            state.cast_vote(ctx, &ctxs[1].player_id).await.unwrap();
        }
        state.finalize_voting(&ctxs[0]).await.unwrap();

        // Simulate a finalizer that crashed after publishing the resolution
        state
            .store
            .update_player(&ctxs[1].player_id, PlayerPatch::dealt(Role::Citizen))
            .await
            .unwrap();

        let host = SyncLoop::new(Arc::new(state.clone()), ctxs[0].clone());
        let view = host.refresh().await.unwrap();
        assert_eq!(view.phase, PhaseKind::ResolvedInterim);
        assert!(!view.roster[1].alive);
    }

    #[tokio::test]
    async fn test_loop_survives_lost_claim() {
        let (state, ctxs) = dealt_round(3, &[2]).await;
        state.open_voting(&ctxs[0]).await.unwrap();
        let room_id = ctxs[0].room_id.clone();

        // Someone else moves the room on before the leader can finalize
        state
            .store
            .update_room(&room_id, None, RoomPatch::phase(RoomPhase::Lobby))
            .await
            .unwrap();

        let host = SyncLoop::new(Arc::new(state.clone()), ctxs[0].clone());
        let view = host.refresh().await.unwrap();
        assert_eq!(view.phase, PhaseKind::Lobby);
    }

    #[tokio::test]
    async fn test_loop_ends_when_renderer_closes() {
        let (state, ctxs) = lobby(2).await;
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let handle = SyncLoop::new(Arc::new(state.clone()), ctxs[0].clone()).spawn(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop did not stop")
            .unwrap();
    }
}
