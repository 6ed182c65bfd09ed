use crate::types::PhaseKind;

/// Check if a phase transition is valid
pub fn is_valid_transition(from: PhaseKind, to: PhaseKind) -> bool {
    use PhaseKind::*;

    match (from, to) {
        // Normal forward flow
        (Lobby, Active) => true,
        (Active, Voting) => true,
        (Voting, ResolvedInterim) => true,
        (Voting, ResolvedFinal) => true,

        // Same round, same roles
        (ResolvedInterim, Active) => true,

        // Reset is accepted from anywhere a round exists
        (Active | Voting | ResolvedInterim | ResolvedFinal, Lobby) => true,

        _ => false,
    }
}

/// Phases reachable from `from`, in a stable order for clients
pub fn valid_transitions(from: PhaseKind) -> Vec<PhaseKind> {
    use PhaseKind::*;

    [Lobby, Active, Voting, ResolvedInterim, ResolvedFinal]
        .into_iter()
        .filter(|to| is_valid_transition(from, *to))
        .collect()
}
