use super::{AppState, Joined};
use crate::error::{GameError, GameResult};
use crate::store::PlayerPatch;
use crate::types::*;
use chrono::Utc;

/// Parse a user-typed room code
fn parse_room_code(code: &str) -> GameResult<RoomCode> {
    let code = code.trim();
    if code.is_empty() {
        return Err(GameError::InvalidInput("room code is required".to_string()));
    }
    code.parse::<RoomCode>()
        .map_err(|_| GameError::InvalidInput(format!("'{}' is not a room code", code)))
}

impl AppState {
    /// Trim a display name and enforce the configured length
    pub(crate) fn validate_name(&self, name: &str) -> GameResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidInput("name is required".to_string()));
        }
        if name.chars().count() > self.config.max_name_chars {
            return Err(GameError::InvalidInput(format!(
                "name must be at most {} characters",
                self.config.max_name_chars
            )));
        }
        Ok(name.to_string())
    }

    /// Insert a player. Anyone arriving after a round started watches until
    /// the next round deals them in.
    pub(crate) async fn add_player(&self, room: &Room, name: String) -> GameResult<Player> {
        let player = self
            .store
            .insert_player(Player {
                id: ulid::Ulid::new().to_string(),
                room_id: room.id.clone(),
                name,
                alive: room.phase.kind() == PhaseKind::Lobby,
                role: None,
                created_at: Utc::now(),
            })
            .await?;
        Ok(player)
    }

    /// Join an existing room by its code
    pub async fn join_room(&self, code: &str, name: &str) -> GameResult<Joined> {
        let code = parse_room_code(code)?;
        let name = self.validate_name(name)?;

        let room = self
            .store
            .find_room_by_code(code)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Room {}", code)))?;

        let mut player = self.add_player(&room, name).await?;

        // A round may have been dealt between reading the room and inserting
        // the player. Without a role they can only watch.
        if player.alive {
            let current = self.current_room(&room.id).await?;
            if current.phase.kind() != PhaseKind::Lobby {
                let dealt = self
                    .store
                    .list_players(&room.id)
                    .await?
                    .into_iter()
                    .find(|p| p.id == player.id)
                    .is_some_and(|p| p.role.is_some());
                if !dealt {
                    self.store
                        .update_player(&player.id, PlayerPatch::eliminated())
                        .await?;
                    player.alive = false;
                }
            }
        }

        tracing::info!(
            room_code = room.code,
            player_id = %player.id,
            spectator = !player.alive,
            "Player joined"
        );

        Ok(Joined {
            ctx: SessionContext {
                room_id: room.id.clone(),
                room_code: room.code,
                player_id: player.id.clone(),
            },
            room,
            player,
        })
    }
}
