//! Secret word draw and impostor selection for a new round.

use rand::Rng;
use std::collections::HashSet;

use crate::error::{GameError, GameResult};
use crate::lexicon::Lexicon;
use crate::types::*;

/// Everything `start_round` needs to write
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPlan {
    pub secret_word: String,
    pub impostors: HashSet<PlayerId>,
}

impl RoundPlan {
    pub fn role_of(&self, player_id: &str) -> Role {
        if self.impostors.contains(player_id) {
            Role::Impostor
        } else {
            Role::Citizen
        }
    }
}

/// Uniform pick from the pooled words
pub fn pick_word<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Option<String> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.random_range(0..pool.len())].to_string())
}

/// Draw `count` distinct players without replacement: pick a random index from
/// the shrinking candidate list and remove it.
pub fn pick_impostors<R: Rng + ?Sized>(
    players: &[Player],
    count: usize,
    rng: &mut R,
) -> HashSet<PlayerId> {
    let mut candidates: Vec<&Player> = players.iter().collect();
    let mut chosen = HashSet::with_capacity(count);

    for _ in 0..count.min(players.len()) {
        let idx = rng.random_range(0..candidates.len());
        chosen.insert(candidates.remove(idx).id.clone());
    }

    chosen
}

/// Validate inputs and draw the word and impostors. Performs no writes.
pub fn plan_round<R: Rng + ?Sized>(
    lexicon: &Lexicon,
    categories: &[String],
    impostor_count: u32,
    players: &[Player],
    rng: &mut R,
) -> GameResult<RoundPlan> {
    let pool = lexicon.pool(categories)?;

    let count = impostor_count as usize;
    if count < 1 || count >= players.len() {
        return Err(GameError::InvalidInput(format!(
            "impostor count must be between 1 and {} for {} players",
            players.len().saturating_sub(1),
            players.len()
        )));
    }

    let secret_word = pick_word(&pool, rng)
        .ok_or_else(|| GameError::InvalidInput("selected categories have no words".to_string()))?;
    let impostors = pick_impostors(players, count, rng);

    Ok(RoundPlan {
        secret_word,
        impostors,
    })
}
