//! Pure game rules. Nothing in here touches the store; every function is a
//! deterministic function of its inputs (plus an explicit RNG for the draw).

pub mod assign;
pub mod outcome;
pub mod roster;
pub mod tally;
pub mod transitions;
