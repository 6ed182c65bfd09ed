use super::AppState;
use crate::error::{GameError, GameResult};
use crate::rules::assign::plan_round;
use crate::store::{PlayerPatch, RoomPatch};
use crate::types::*;

impl AppState {
    /// Deal a new round: draw the secret word from `categories`, pick
    /// impostors and revive everyone.
    ///
    /// The room is claimed with a guarded Lobby -> Active write first. Only the
    /// call that wins the claim deals roles, so two racing leaders can never
    /// leave the room with mixed assignments.
    pub async fn start_round(
        &self,
        ctx: &SessionContext,
        categories: &[String],
        impostor_count: Option<u32>,
    ) -> GameResult<Room> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        Self::require_leader(&snapshot, ctx, "start a round")?;

        let room = &snapshot.room;
        match room.phase.kind() {
            PhaseKind::Lobby => {}
            PhaseKind::Active => {
                tracing::debug!(room_code = room.code, "Round already started");
                return Ok(snapshot.room);
            }
            other => {
                return Err(GameError::IllegalTransition(format!(
                    "cannot start a round from {:?}",
                    other
                )))
            }
        }

        let impostor_count = impostor_count.unwrap_or(room.impostor_count);
        let plan = {
            let mut rng = rand::rng();
            plan_round(
                &self.lexicon,
                categories,
                impostor_count,
                &snapshot.players,
                &mut rng,
            )?
        };

        let ballot = room.ballot + 1;
        let claimed = self
            .store
            .update_room(
                &room.id,
                Some(PhaseKind::Lobby),
                RoomPatch {
                    phase: Some(RoomPhase::Active {
                        secret_word: plan.secret_word.clone(),
                    }),
                    impostor_count: Some(impostor_count),
                    round_no: Some(room.round_no + 1),
                    ballot: Some(ballot),
                },
            )
            .await?;
        if !claimed {
            tracing::debug!(room_code = room.code, "Lost the race to start the round");
            return self.current_room(&room.id).await;
        }

        // Anyone who joined between the snapshot and the claim is dealt in as a
        // citizen
        let players = self.store.list_players(&room.id).await?;

        // A reset that landed after the claim owns the room now
        let current = self.current_room(&room.id).await?;
        if current.ballot != ballot {
            tracing::debug!(room_code = room.code, "Room reset before roles were dealt");
            return Ok(current);
        }

        for player in &players {
            self.store
                .update_player(&player.id, PlayerPatch::dealt(plan.role_of(&player.id)))
                .await?;
        }
        self.store.delete_stale_votes(&room.id, ballot).await?;

        tracing::info!(
            room_code = room.code,
            round_no = room.round_no + 1,
            players = players.len(),
            impostors = impostor_count,
            "Round started"
        );
        self.current_room(&room.id).await
    }

    /// Resume discussion after an elimination that did not end the round.
    /// Same word, same roles, the eliminated player stays out.
    pub async fn continue_round(&self, ctx: &SessionContext) -> GameResult<Room> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        Self::require_leader(&snapshot, ctx, "continue the round")?;

        let room = &snapshot.room;
        let (secret_word, resolution) = match &room.phase {
            RoomPhase::ResolvedInterim {
                secret_word,
                resolution,
            } => (secret_word.clone(), resolution),
            RoomPhase::Active { .. } => {
                tracing::debug!(room_code = room.code, "Round already continued");
                return Ok(snapshot.room);
            }
            other => {
                return Err(GameError::IllegalTransition(format!(
                    "cannot continue from {:?}",
                    other.kind()
                )))
            }
        };

        // The finalizer may have died between claiming and marking the player
        if snapshot
            .player(&resolution.eliminated_id)
            .is_some_and(|p| p.alive)
        {
            self.store
                .update_player(&resolution.eliminated_id, PlayerPatch::eliminated())
                .await?;
        }

        let claimed = self
            .store
            .update_room(
                &room.id,
                Some(PhaseKind::ResolvedInterim),
                RoomPatch::phase(RoomPhase::Active { secret_word }),
            )
            .await?;
        if claimed {
            tracing::info!(room_code = room.code, "Round continues");
        }
        self.current_room(&room.id).await
    }

    /// Send the room back to the lobby from any phase: roles cleared,
    /// everyone revived, votes discarded.
    pub async fn reset_to_lobby(&self, ctx: &SessionContext) -> GameResult<Room> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        Self::require_leader(&snapshot, ctx, "reset the room")?;

        let room = &snapshot.room;
        let kind = room.phase.kind();
        let mut ballot = room.ballot;

        if kind != PhaseKind::Lobby {
            ballot += 1;
            let claimed = self
                .store
                .update_room(
                    &room.id,
                    Some(kind),
                    RoomPatch {
                        phase: Some(RoomPhase::Lobby),
                        ballot: Some(ballot),
                        ..Default::default()
                    },
                )
                .await?;
            if !claimed {
                tracing::debug!(room_code = room.code, "Room changed underneath reset");
                return self.current_room(&room.id).await;
            }
        }

        self.store
            .update_players(&room.id, PlayerPatch::cleared())
            .await?;
        self.store.delete_stale_votes(&room.id, ballot).await?;

        tracing::info!(room_code = room.code, from = ?kind, "Room reset to lobby");
        self.current_room(&room.id).await
    }
}
