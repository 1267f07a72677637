//! Match lock coordinator.
//!
//! The serialization point for everything that mutates a match: seat a
//! caller, roll, forfeit, abandon, poll. Each operation holds the
//! per-match Postgres row lock for its full validation+mutation span, so
//! at most one transition commits per match at a time, and settlement
//! rides inside the same transaction as the transition that triggered it.
//!
//! - [`Lobby`] — the coordinator (plus the timeout supervisor impl)
//! - [`Caller`] — human/agent identity flowing through roll and forfeit
//! - [`MatchError`] — domain errors, one HTTP status each
//! - [`Summary`] — wire-facing match view
mod caller;
mod coordinator;
mod error;
mod supervisor;

pub use caller::*;
pub use coordinator::*;
pub use error::*;
