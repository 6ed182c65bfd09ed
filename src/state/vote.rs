use super::{AppState, RoomSnapshot};
use crate::error::{GameError, GameResult};
use crate::rules::{outcome::resolve_elimination, tally};
use crate::store::{PlayerPatch, RoomPatch};
use crate::types::*;
use chrono::Utc;

impl AppState {
    /// Move an active round to voting. Opens a fresh ballot so nothing cast
    /// before this point can count.
    pub async fn open_voting(&self, ctx: &SessionContext) -> GameResult<Room> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        Self::require_leader(&snapshot, ctx, "open voting")?;

        let room = &snapshot.room;
        let secret_word = match &room.phase {
            RoomPhase::Active { secret_word } => secret_word.clone(),
            RoomPhase::Voting { .. } => {
                tracing::debug!(room_code = room.code, "Voting already open");
                return Ok(snapshot.room);
            }
            other => {
                return Err(GameError::IllegalTransition(format!(
                    "cannot open voting from {:?}",
                    other.kind()
                )))
            }
        };

        let ballot = room.ballot + 1;
        let claimed = self
            .store
            .update_room(
                &room.id,
                Some(PhaseKind::Active),
                RoomPatch {
                    phase: Some(RoomPhase::Voting { secret_word }),
                    ballot: Some(ballot),
                    ..Default::default()
                },
            )
            .await?;
        if claimed {
            self.store.delete_stale_votes(&room.id, ballot).await?;
            tracing::info!(room_code = room.code, ballot, "Voting opened");
        }
        self.current_room(&room.id).await
    }

    /// Record a vote from the caller. Duplicates are stored; only the earliest
    /// vote per voter is counted.
    pub async fn cast_vote(&self, ctx: &SessionContext, target_id: &str) -> GameResult<Vote> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        let room = &snapshot.room;

        if room.phase.kind() != PhaseKind::Voting {
            return Err(GameError::IllegalTransition(format!(
                "cannot vote during {:?}",
                room.phase.kind()
            )));
        }

        let voter = snapshot
            .player(&ctx.player_id)
            .ok_or_else(|| GameError::NotFound(format!("Player {}", ctx.player_id)))?;
        if !voter.alive {
            return Err(GameError::IllegalTransition(
                "eliminated players cannot vote".to_string(),
            ));
        }

        match snapshot.player(target_id) {
            Some(target) if target.alive => {}
            Some(_) => {
                return Err(GameError::InvalidInput(format!(
                    "{} is not alive",
                    target_id
                )))
            }
            None => {
                return Err(GameError::InvalidInput(format!(
                    "{} is not in this room",
                    target_id
                )))
            }
        }

        let vote = self
            .store
            .insert_vote(Vote {
                id: ulid::Ulid::new().to_string(),
                room_id: room.id.clone(),
                ballot: room.ballot,
                voter_id: ctx.player_id.clone(),
                target_id: target_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::debug!(
            room_code = room.code,
            voter = %vote.voter_id,
            target = %vote.target_id,
            "Vote cast"
        );
        Ok(vote)
    }

    /// Leader request to close the ballot. A no-op until every alive player
    /// has voted, and after someone else already closed it.
    pub async fn finalize_voting(&self, ctx: &SessionContext) -> GameResult<Room> {
        let snapshot = self.snapshot(&ctx.room_id).await?;
        Self::require_leader(&snapshot, ctx, "finalize voting")?;

        let room_id = snapshot.room.id.clone();
        match snapshot.room.phase.kind() {
            PhaseKind::Voting => {
                self.close_ballot(&snapshot).await?;
            }
            PhaseKind::ResolvedInterim | PhaseKind::ResolvedFinal => {
                self.repair_elimination(&snapshot).await?;
            }
            other => {
                return Err(GameError::IllegalTransition(format!(
                    "cannot finalize voting from {:?}",
                    other
                )))
            }
        }
        self.current_room(&room_id).await
    }

    /// Tally a complete ballot and publish the resolution. Returns whether
    /// this call performed the transition.
    ///
    /// The resolved phase is claimed with a guarded write before the
    /// eliminated player is marked, so concurrent finalizers produce exactly
    /// one resolution and one death.
    pub async fn close_ballot(&self, snapshot: &RoomSnapshot) -> GameResult<bool> {
        if !snapshot.voting_complete() {
            return Ok(false);
        }
        let room = &snapshot.room;
        let Some(secret_word) = room.secret_word() else {
            return Ok(false);
        };

        let eliminated = tally::tally(&snapshot.votes, &snapshot.players)
            .and_then(|id| snapshot.player(&id));
        let Some(eliminated) = eliminated else {
            // Everyone voted for players who are no longer alive
            tracing::warn!(room_code = room.code, "Ballot complete with no eligible target");
            return Ok(false);
        };

        let survivors: Vec<Player> = snapshot
            .players
            .iter()
            .filter(|p| p.alive && p.id != eliminated.id)
            .cloned()
            .collect();
        let resolution = resolve_elimination(eliminated, &survivors);
        let outcome = resolution.outcome;

        let claimed = self
            .store
            .update_room(
                &room.id,
                Some(PhaseKind::Voting),
                RoomPatch::phase(resolution.into_phase(secret_word.to_string())),
            )
            .await?;
        if !claimed {
            tracing::debug!(room_code = room.code, "Ballot already closed");
            return Ok(false);
        }

        self.store
            .update_player(&eliminated.id, PlayerPatch::eliminated())
            .await?;

        tracing::info!(
            room_code = room.code,
            eliminated = %eliminated.name,
            outcome = ?outcome,
            "Voting resolved"
        );
        Ok(true)
    }

    /// Mark the eliminated player dead if a resolution was published but the
    /// follow-up write never landed. Returns whether anything was written.
    pub async fn repair_elimination(&self, snapshot: &RoomSnapshot) -> GameResult<bool> {
        let Some(resolution) = snapshot.room.phase.resolution() else {
            return Ok(false);
        };
        let still_alive = snapshot
            .player(&resolution.eliminated_id)
            .is_some_and(|p| p.alive);
        if !still_alive {
            return Ok(false);
        }

        self.store
            .update_player(&resolution.eliminated_id, PlayerPatch::eliminated())
            .await?;
        tracing::warn!(
            room_code = snapshot.room.code,
            player_id = %resolution.eliminated_id,
            "Repaired missing elimination"
        );
        Ok(true)
    }
}
