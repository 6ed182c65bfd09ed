//! What a single client gets to see of a room.
//!
//! Derived purely from a snapshot and the viewer's player id. Everything
//! role-dependent is filtered here, so the same snapshot renders differently
//! for an impostor and a citizen.

use serde::{Deserialize, Serialize};

use crate::rules::{tally, transitions::valid_transitions};
use crate::state::RoomSnapshot;
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientView {
    pub room_code: RoomCode,
    pub phase: PhaseKind,
    pub round_no: u32,
    pub is_leader: bool,
    /// `None` if the viewer is not (or no longer) in the room
    pub me: Option<SelfInfo>,
    /// Only for citizens while a round is running
    pub secret_word: Option<String>,
    pub roster: Vec<RosterEntry>,
    /// Who I may vote for right now. Empty unless I still have a vote to cast.
    pub vote_targets: Vec<VoteTarget>,
    pub votes_cast: usize,
    pub votes_needed: usize,
    pub result_text: Option<String>,
    /// Phases the room can move to next, shown to the leader only. From
    /// Voting the resolved phases are reached by closing the ballot, which
    /// the leader triggers with a finalize request or the sync loop does once
    /// every vote is in.
    pub valid_transitions: Vec<PhaseKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelfInfo {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
    pub role: Option<Role>,
    pub has_voted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
    pub is_leader: bool,
    pub has_voted: bool,
    /// Revealed once the round is over
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteTarget {
    pub id: PlayerId,
    pub name: String,
}

impl ClientView {
    pub fn derive(snapshot: &RoomSnapshot, my_id: &str) -> Self {
        let room = &snapshot.room;
        let phase = room.phase.kind();
        let voting = phase == PhaseKind::Voting;
        let is_leader = snapshot.is_leader(my_id);
        let me = snapshot.player(my_id);
        let effective = tally::effective_votes(&snapshot.votes);
        let voted = |id: &str| voting && effective.iter().any(|v| v.voter_id == id);

        let secret_word = match me {
            Some(p) if p.role == Some(Role::Citizen) => {
                room.secret_word().map(str::to_string)
            }
            _ => None,
        };

        let reveal = phase == PhaseKind::ResolvedFinal;
        let leader_id =
            crate::rules::roster::elect_leader(&snapshot.players).map(|p| p.id.as_str());
        let roster = snapshot
            .players
            .iter()
            .map(|p| RosterEntry {
                id: p.id.clone(),
                name: p.name.clone(),
                alive: p.alive,
                is_leader: Some(p.id.as_str()) == leader_id,
                has_voted: voted(p.id.as_str()),
                role: if reveal { p.role } else { None },
            })
            .collect();

        let can_vote = voting && me.is_some_and(|p| p.alive) && !voted(my_id);
        let vote_targets = if can_vote {
            snapshot
                .alive_players()
                .into_iter()
                .filter(|p| p.id != my_id)
                .map(|p| VoteTarget {
                    id: p.id.clone(),
                    name: p.name.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let (votes_cast, votes_needed) = if voting {
            (
                tally::distinct_voters(&snapshot.votes),
                snapshot.alive_players().len(),
            )
        } else {
            (0, 0)
        };

        Self {
            room_code: room.code,
            phase,
            round_no: room.round_no,
            is_leader,
            me: me.map(|p| SelfInfo {
                id: p.id.clone(),
                name: p.name.clone(),
                alive: p.alive,
                // Nobody holds a role in the lobby, whatever a stale deal left behind
                role: if phase == PhaseKind::Lobby { None } else { p.role },
                has_voted: voted(p.id.as_str()),
            }),
            secret_word,
            roster,
            vote_targets,
            votes_cast,
            votes_needed,
            result_text: room.result_text().map(str::to_string),
            valid_transitions: if is_leader {
                valid_transitions(phase)
            } else {
                Vec::new()
            },
        }
    }
}
