use rand::seq::SliceRandom;
use spin_core::*;
use spin_database::*;
use spin_live::LiveState;
use spin_lobby::*;
use spin_records::*;
use std::time::SystemTime;

/// Agent backfill service.
///
/// Seats house agents into WAITING matches that sat unfilled past the
/// grace window, topping each agent up to the balance floor and charging
/// the same entry fee a human pays. All of it under the match row lock,
/// so backfill and a late human join cannot double-seat.
#[derive(Clone)]
pub struct Backfill {
    lobby: Lobby,
}

impl Backfill {
    pub fn new(lobby: Lobby) -> Self {
        Self { lobby }
    }

    /// Fills one match's vacancies with agents. No-op unless the match
    /// is WAITING and older than the grace window. Returns whether the
    /// match went ACTIVE.
    pub async fn backfill(&self, id: ID<Match>) -> Result<bool, MatchError> {
        let mut client = self.lobby.db().conn().await?;
        let tx = client.transaction().await?;
        let mut m = match tx.lock_match(id).await? {
            Some(m) => m,
            None => return Ok(false),
        };
        if m.status != MatchStatus::Waiting {
            return Ok(false);
        }
        if m.age().as_secs() < BACKFILL_GRACE_SECS {
            return Ok(false);
        }
        let rule = match tx.stake_rule(m.stake, m.players).await? {
            Some(rule) => rule,
            None => {
                log::warn!("[filler] {} has no stake rule, skipping", id);
                return Ok(false);
            }
        };
        let seated = m.seats().iter().flatten().copied().collect::<Vec<_>>();
        let mut candidates = tx.agents_excluding(&seated).await?;
        candidates.shuffle(&mut rand::rng());
        while let Some(slot) = m.vacancy() {
            let agent = match candidates.pop() {
                Some(agent) => agent,
                None => break,
            };
            tx.raise_floor(agent.id, AGENT_MIN_BALANCE).await?;
            charge(&tx, agent.id, rule.entry_fee, m.id).await?;
            m.slots[slot] = Some(agent.id);
            log::info!("[filler] seated agent {} at slot {} in {}", agent.id, slot, id);
        }
        let activated = m.is_full();
        if activated {
            m.status = MatchStatus::Active;
            m.turn = Match::draw_turn(m.players);
            m.started_at = Some(SystemTime::now());
        }
        tx.update_match(&m).await?;
        tx.commit().await?;
        self.lobby.live().write(m.id, &LiveState::seed(&m)).await;
        if activated {
            log::info!("[filler] {} filled with agents, ACTIVE", id);
        }
        Ok(activated)
    }

    /// Background scan over stale WAITING matches. Per-match failures
    /// are logged and never stop the pass.
    pub async fn filler_loop(self) {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(FILLER_INTERVAL_SECS)).await;
            if let Err(e) = self.fill_pass().await {
                log::warn!("[filler] pass failed: {}", e);
            }
        }
    }

    async fn fill_pass(&self) -> Result<(), MatchError> {
        let client = self.lobby.db().conn().await?;
        let stale = client.stale_waiting(BACKFILL_GRACE_SECS, SCAN_LIMIT).await?;
        drop(client);
        for id in stale {
            if let Err(e) = self.backfill(id).await {
                log::warn!("[filler] backfill failed for {}: {}", id, e);
            }
        }
        Ok(())
    }
}
