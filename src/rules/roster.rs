//! Canonical player order and leader election.
//!
//! Every client runs these on its own copy of the roster after each refresh.
//! The same stored roster always yields the same order and the same leader,
//! so no handoff message is ever needed.

use std::cmp::Ordering;

use crate::types::*;

/// Join order: creation time, then id so equal timestamps still sort the same everywhere
pub fn roster_cmp(a: &Player, b: &Player) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_roster(players: &mut [Player]) {
    players.sort_by(roster_cmp);
}

/// The earliest-joined player present in the roster
pub fn elect_leader(players: &[Player]) -> Option<&Player> {
    players.iter().min_by(|a, b| roster_cmp(a, b))
}

pub fn is_leader(player_id: &str, players: &[Player]) -> bool {
    elect_leader(players).is_some_and(|leader| leader.id == player_id)
}

/// Alive players in roster order
pub fn alive_players(players: &[Player]) -> Vec<&Player> {
    let mut alive: Vec<&Player> = players.iter().filter(|p| p.alive).collect();
    alive.sort_by(|a, b| roster_cmp(a, b));
    alive
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Players p1..pn joined one second apart, all alive, no roles
    pub fn roster(n: usize) -> Vec<Player> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        (1..=n)
            .map(|i| Player {
                id: format!("p{}", i),
                room_id: "room".to_string(),
                name: format!("Player {}", i),
                alive: true,
                role: None,
                created_at: base + Duration::seconds(i as i64),
            })
            .collect()
    }

    /// Roster where the listed players are impostors and the rest citizens
    pub fn dealt(n: usize, impostors: &[&str]) -> Vec<Player> {
        roster(n)
            .into_iter()
            .map(|mut p| {
                p.role = Some(if impostors.contains(&p.id.as_str()) {
                    Role::Impostor
                } else {
                    Role::Citizen
                });
                p
            })
            .collect()
    }
}
