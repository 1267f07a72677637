//! Pure board-transition rules.
//!
//! [`Board`] is the functional core of the match engine: one roll in, one
//! deterministic transition out. It knows nothing about accounts, forfeits,
//! or persistence; callers own turn eligibility and skip absent seats.
mod dice;
mod rules;

pub use dice::*;
pub use rules::*;
