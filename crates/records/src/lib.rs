//! Durable domain records.
//!
//! The types here are the source of truth for settlement and history.
//! Ephemeral rendering state lives in `spin-live` and is rebuildable;
//! these records are not.
//!
//! ## Core Types
//!
//! - [`Match`] — One dice match: slots, status, turn, money bookkeeping
//! - [`MatchStatus`] — WAITING / ACTIVE / FINISHED / ABANDONED
//! - [`Account`] — Identity + balance view from the external provider
//! - [`LedgerEntry`] — Append-only money movement audit row
//! - [`Stake`] — Immutable (stake, players) → fee/payout rule
mod account;
mod ledger;
mod r#match;
mod stake;

pub use account::*;
pub use ledger::*;
pub use r#match::*;
pub use stake::*;
