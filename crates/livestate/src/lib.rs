//! Ephemeral live match state over Redis.
//!
//! The durable store owns match history; this crate owns the moment. Each
//! match keeps one JSON snapshot under `match:{id}:state` with a 24 h
//! expiry, and every write is mirrored verbatim onto the pub/sub channel
//! `match:{id}:events` for WebSocket fanout.
//!
//! - [`LiveState`] — the snapshot payload
//! - [`Live`] — the Redis client (best-effort writes, degrading reads)
mod client;
mod snapshot;

pub use client::*;
pub use snapshot::*;
