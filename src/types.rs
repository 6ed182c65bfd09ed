use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type VoteId = String;

/// Human-shareable join code (5 digits)
pub type RoomCode = u32;

pub const ROOM_CODE_MIN: RoomCode = 10_000;
pub const ROOM_CODE_MAX: RoomCode = 99_999;

/// Fieldless discriminant of [`RoomPhase`], used for guards and conditional writes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    Lobby,
    Active,
    Voting,
    ResolvedInterim,
    ResolvedFinal,
}

/// Lifecycle of a room. Each phase carries exactly the data that is valid in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    Lobby,
    Active {
        secret_word: String,
    },
    Voting {
        secret_word: String,
    },
    /// Someone was eliminated but the round goes on. The word is parked here
    /// so `continue_round` can bring it back without a new draw.
    ResolvedInterim {
        secret_word: String,
        resolution: Resolution,
    },
    ResolvedFinal {
        resolution: Resolution,
    },
}

impl RoomPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            RoomPhase::Lobby => PhaseKind::Lobby,
            RoomPhase::Active { .. } => PhaseKind::Active,
            RoomPhase::Voting { .. } => PhaseKind::Voting,
            RoomPhase::ResolvedInterim { .. } => PhaseKind::ResolvedInterim,
            RoomPhase::ResolvedFinal { .. } => PhaseKind::ResolvedFinal,
        }
    }

    /// The secret word, visible only while a round is running
    pub fn secret_word(&self) -> Option<&str> {
        match self {
            RoomPhase::Active { secret_word } | RoomPhase::Voting { secret_word } => {
                Some(secret_word)
            }
            _ => None,
        }
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            RoomPhase::ResolvedInterim { resolution, .. }
            | RoomPhase::ResolvedFinal { resolution } => Some(resolution),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Impostor,
    Citizen,
}

impl Role {
    /// Article + noun, for result texts
    pub fn describe(&self) -> &'static str {
        match self {
            Role::Impostor => "an impostor",
            Role::Citizen => "a citizen",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CitizensWin,
    ImpostorsWin,
    Continues,
}

/// What happened when a voting phase closed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub eliminated_id: PlayerId,
    pub eliminated_name: String,
    pub eliminated_role: Role,
    pub result_text: String,
}

impl Resolution {
    /// Phase the room moves to once this resolution is recorded
    pub fn into_phase(self, secret_word: String) -> RoomPhase {
        match self.outcome {
            Outcome::Continues => RoomPhase::ResolvedInterim {
                secret_word,
                resolution: self,
            },
            Outcome::CitizensWin | Outcome::ImpostorsWin => {
                RoomPhase::ResolvedFinal { resolution: self }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub default_impostor_count: u32,
    pub max_name_chars: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_impostor_count: 1,
            max_name_chars: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub phase: RoomPhase,
    pub impostor_count: u32,
    pub round_no: u32,
    /// Bumped every time a fresh set of votes starts counting
    pub ballot: u32,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn secret_word(&self) -> Option<&str> {
        self.phase.secret_word()
    }

    pub fn result_text(&self) -> Option<&str> {
        self.phase.resolution().map(|r| r.result_text.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub alive: bool,
    pub role: Option<Role>,
    /// Roster order and leader election key
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn is_impostor(&self) -> bool {
        self.role == Some(Role::Impostor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub room_id: RoomId,
    pub ballot: u32,
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
    pub created_at: DateTime<Utc>,
}

/// Who "I" am in a room. Created by create/join and passed to every operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionContext {
    pub room_id: RoomId,
    pub room_code: RoomCode,
    pub player_id: PlayerId,
}
