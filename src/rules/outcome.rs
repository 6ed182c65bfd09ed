//! Win-condition evaluation after an elimination.

use crate::types::*;

/// Decide how the round stands once `eliminated` is out.
///
/// `survivors` are the alive players after the elimination. Rules apply in order:
/// 1. an impostor went out and none remain: citizens win
/// 2. impostors are at least as many as citizens: impostors win
/// 3. otherwise the round continues
pub fn resolve_elimination(eliminated: &Player, survivors: &[Player]) -> Resolution {
    let impostors = survivors
        .iter()
        .filter(|p| p.alive && p.id != eliminated.id && p.is_impostor())
        .count();
    let citizens = survivors
        .iter()
        .filter(|p| p.alive && p.id != eliminated.id && p.role == Some(Role::Citizen))
        .count();

    // Players without a role were never dealt in; treat them as citizens
    let eliminated_role = eliminated.role.unwrap_or(Role::Citizen);

    let outcome = if eliminated_role == Role::Impostor && impostors == 0 {
        Outcome::CitizensWin
    } else if impostors >= citizens {
        Outcome::ImpostorsWin
    } else {
        Outcome::Continues
    };

    let verdict = match outcome {
        Outcome::CitizensWin => "The citizens win!".to_string(),
        Outcome::ImpostorsWin => "The impostors win!".to_string(),
        Outcome::Continues if eliminated_role == Role::Impostor => {
            format!("{} impostor(s) still hiding. The round continues.", impostors)
        }
        Outcome::Continues => "The round continues.".to_string(),
    };

    Resolution {
        outcome,
        eliminated_id: eliminated.id.clone(),
        eliminated_name: eliminated.name.clone(),
        eliminated_role,
        result_text: format!(
            "{} was eliminated. They were {}. {}",
            eliminated.name,
            eliminated_role.describe(),
            verdict
        ),
    }
}
