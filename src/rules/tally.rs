//! Vote counting and completion detection.
//!
//! Callers pass only the votes of the current ballot. The ledger accepts
//! duplicate votes from the same voter; only a voter's earliest vote counts here.

use std::collections::{HashMap, HashSet};

use crate::rules::roster::alive_players;
use crate::types::*;

/// Each voter's earliest vote
pub fn effective_votes(votes: &[Vote]) -> Vec<&Vote> {
    let mut ordered: Vec<&Vote> = votes.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|v| seen.insert(v.voter_id.as_str()))
        .collect()
}

/// Votes per target, counting one vote per voter
pub fn count_votes(votes: &[Vote]) -> HashMap<PlayerId, u32> {
    let mut counts = HashMap::new();
    for vote in effective_votes(votes) {
        *counts.entry(vote.target_id.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn distinct_voters(votes: &[Vote]) -> usize {
    votes
        .iter()
        .map(|v| v.voter_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn has_voted(player_id: &str, votes: &[Vote]) -> bool {
    votes.iter().any(|v| v.voter_id == player_id)
}

/// Voting is complete once at least as many distinct voters have voted as there
/// are alive players. `>=` keeps a stale alive count from stalling the round.
/// An empty ballot is never complete.
pub fn is_voting_complete(votes: &[Vote], players: &[Player]) -> bool {
    !votes.is_empty() && distinct_voters(votes) >= alive_players(players).len()
}

/// The eliminated player, or `None` if no alive player received a vote.
///
/// Alive players are scanned in roster order and a player replaces the current
/// pick only when their count is strictly greater, so on a tie the
/// earliest-joined of the tied players is eliminated.
pub fn tally(votes: &[Vote], players: &[Player]) -> Option<PlayerId> {
    let counts = count_votes(votes);

    let mut max = 0;
    let mut eliminated = None;
    for player in alive_players(players) {
        let count = counts.get(&player.id).copied().unwrap_or(0);
        if count > max {
            max = count;
            eliminated = Some(player.id.clone());
        }
    }
    eliminated
}
