use super::*;
use rand::Rng;
use spin_board::Roll;
use spin_core::*;
use spin_database::*;
use spin_live::LiveState;
use spin_records::{Match, MatchStatus};
use std::time::SystemTime;

/// Turn timeout supervision.
///
/// The backstop that guarantees every ACTIVE match terminates: when a
/// seat sits idle past the threshold, the supervisor rolls on its behalf
/// through the same code path as a real roll. Invoked from status polls
/// and from a jittered background sweep.
impl Lobby {
    /// Rolls for the current seat if the match is ACTIVE and idle past
    /// [`TURN_TIMEOUT_SECS`]. Returns whether a turn was applied.
    pub async fn advance_if_stalled(&self, id: ID<Match>) -> Result<bool, MatchError> {
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        let mut m = match tx.lock_match(id).await? {
            Some(m) => m,
            None => return Ok(false),
        };
        if m.status != MatchStatus::Active {
            return Ok(false);
        }
        let mut live = match self.live.read(id).await {
            Some(live) => live,
            None => {
                // Persist the synthesized snapshot, else every sweep
                // re-stamps "now" and idleness never accumulates for a
                // match whose snapshot was lost.
                let seeded = LiveState::seed(&m);
                self.live.write(id, &seeded).await;
                seeded
            }
        };
        if !stalled(&live) {
            return Ok(false);
        }
        if m.active_slots().is_empty() {
            m.status = MatchStatus::Abandoned;
            m.refundable = false;
            m.finished_at = Some(SystemTime::now());
            tx.update_match(&m).await?;
            tx.commit().await?;
            live.sync(&m);
            self.live.write(id, &live).await;
            self.live.clear(id).await;
            log::warn!("[supervisor] {} had no active seats, abandoned", id);
            return Ok(true);
        }
        // live_turn retargets onto the lowest active seat when the stored
        // turn references a forfeited or empty one.
        let slot = m.live_turn();
        let roll = Roll::random();
        log::info!("[supervisor] rolling {} for idle slot {} in {}", roll, slot, id);
        let finished = apply_turn(&tx, &mut m, &mut live, slot, roll).await?;
        tx.commit().await?;
        self.live.write(id, &live).await;
        if finished {
            self.live.clear(id).await;
        }
        Ok(true)
    }

    /// Background sweep over every ACTIVE match, jittered so replicas
    /// do not thunder together. Per-match failures are logged and never
    /// stop the scan.
    pub async fn sweep_loop(self) {
        loop {
            let secs = rand::rng().random_range(SWEEP_INTERVAL_SECS.0..=SWEEP_INTERVAL_SECS.1);
            tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
            if let Err(e) = self.sweep().await {
                log::warn!("[supervisor] sweep failed: {}", e);
            }
        }
    }

    async fn sweep(&self) -> Result<(), MatchError> {
        let client = self.db.conn().await?;
        let matches = client.active_matches().await?;
        drop(client);
        for m in matches {
            if let Err(e) = self.advance_if_stalled(m.id).await {
                log::warn!("[supervisor] advance failed for {}: {}", m.id, e);
            }
        }
        Ok(())
    }
}

/// Whether a seat has sat on this snapshot past the turn timeout.
pub(crate) fn stalled(live: &LiveState) -> bool {
    live.idle_ms() >= TURN_TIMEOUT_SECS * 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_snapshot() -> LiveState {
        let mut m = Match::open(UserId(1), 10, 2, None);
        m.slots[1] = Some(UserId(2));
        m.status = MatchStatus::Active;
        LiveState::seed(&m)
    }

    #[test]
    fn fresh_snapshot_is_not_stalled() {
        assert!(!stalled(&active_snapshot()));
    }
    #[test]
    fn idle_past_threshold_is_stalled() {
        let mut live = active_snapshot();
        live.last_turn_ms = LiveState::now_ms() - (TURN_TIMEOUT_SECS * 1000 + 500);
        assert!(stalled(&live));
    }
    #[test]
    fn synthesized_snapshot_keeps_its_stamp_across_round_trips() {
        // A lost snapshot is re-seeded once and written back; the stamp
        // must survive the trip so idleness accumulates between sweeps.
        let mut live = active_snapshot();
        live.last_turn_ms = LiveState::now_ms() - 6_000;
        let json = serde_json::to_string(&live).unwrap();
        let back: LiveState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_turn_ms, live.last_turn_ms);
        assert!(back.idle_ms() >= 6_000);
        assert!(!stalled(&back));
    }
}
