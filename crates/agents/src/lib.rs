//! House agents: backfill and autoplay.
//!
//! Two background services keep matches moving when humans are scarce.
//! [`Backfill`] seats agents into stale WAITING matches; [`Autoplay`]
//! rolls for agent seats in ACTIVE matches that contain a human. Both go
//! through the lobby's locked mutation paths, never around them.
mod pool;
mod worker;

pub use pool::*;
pub use worker::*;

#[cfg(test)]
mod tests {
    use spin_core::*;
    use spin_records::*;

    #[test]
    fn all_agent_tables_are_left_alone() {
        let mut m = Match::open(UserId(-1), 10, 2, None);
        m.slots[1] = Some(UserId(-2));
        m.status = MatchStatus::Active;
        assert!(!m.has_human());
    }
    #[test]
    fn seated_agents_are_excluded_from_candidates() {
        let mut m = Match::open(UserId(7), 10, 3, None);
        m.slots[1] = Some(UserId(-3));
        let seated = m.seats().iter().flatten().copied().collect::<Vec<_>>();
        assert!(seated.contains(&UserId(-3)));
        assert!(agent_pool().any(|a| !seated.contains(&a)));
    }
}
