use super::{AppState, Joined};
use crate::error::GameResult;
use crate::types::*;
use chrono::Utc;
use rand::Rng;

/// Attempts at drawing a code no other room uses before accepting a duplicate
const CODE_ATTEMPTS: usize = 8;

/// Generate a random five-digit room code
fn generate_room_code() -> RoomCode {
    rand::rng().random_range(ROOM_CODE_MIN..=ROOM_CODE_MAX)
}

impl AppState {
    /// Pick a room code, retrying on collision. Joins resolve a duplicated code
    /// to the newest room, so exhausting the attempts is not fatal.
    async fn allocate_room_code(&self) -> GameResult<RoomCode> {
        let mut code = generate_room_code();
        for _ in 0..CODE_ATTEMPTS {
            if self.store.find_room_by_code(code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!(code, "Room code collision, drawing again");
            code = generate_room_code();
        }
        tracing::warn!(code, "Reusing a room code after {} collisions", CODE_ATTEMPTS);
        Ok(code)
    }

    /// Create a room in the lobby and add its creator as the first player
    pub async fn create_room(&self, host_name: &str) -> GameResult<Joined> {
        let name = self.validate_name(host_name)?;
        let code = self.allocate_room_code().await?;

        let room = self
            .store
            .insert_room(Room {
                id: ulid::Ulid::new().to_string(),
                code,
                phase: RoomPhase::Lobby,
                impostor_count: self.config.default_impostor_count,
                round_no: 0,
                ballot: 0,
                created_at: Utc::now(),
            })
            .await?;

        let player = self.add_player(&room, name).await?;
        tracing::info!(room_code = room.code, player_id = %player.id, "Room created");

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
