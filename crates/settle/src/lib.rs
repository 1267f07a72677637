//! Exactly-once prize settlement.
//!
//! Runs inside the caller's transaction while the match row lock is held,
//! so the FINISHED flip, the winner credit, the merchant credit, and
//! their ledger rows commit or roll back together. Callers guarantee the
//! match is still ACTIVE when they invoke [`distribute_prize`]; that plus
//! the row lock is what makes settlement exactly-once.
mod error;

pub use error::*;

use spin_core::*;
use spin_database::*;
use spin_records::*;
use std::time::SystemTime;
use tokio_postgres::GenericClient;

/// Splits the money for a finished match: `(pot, prize, fee)`.
///
/// The pot is entry fees actually collected from paying humans; agents
/// never contribute. The prize is the configured payout capped by the
/// pot, so the house fee is never negative even when agents filled most
/// slots.
pub fn split(rule: &Stake, humans: usize) -> (Chips, Chips, Chips) {
    let pot = rule.entry_fee * humans as Chips;
    let prize = rule.winner_payout.min(pot);
    (pot, prize, pot - prize)
}

/// Pays out the winner and the house, and marks the match FINISHED.
///
/// The winner slot must hold a human account. The house cut goes to the
/// match's recorded merchant unless that account is a participant, in
/// which case the system merchant is resolved fresh by name; if both are
/// disqualified the fee stays uncredited and is only logged.
pub async fn distribute_prize<C>(
    tx: &C,
    m: &mut Match,
    winner_slot: Slot,
) -> Result<(), SettleError>
where
    C: GenericClient + Sync,
{
    let winner = m
        .occupant(winner_slot)
        .filter(UserId::is_human)
        .ok_or(SettleError::InvalidWinner(winner_slot))?;
    let rule = tx
        .stake_rule(m.stake, m.players)
        .await?
        .ok_or(SettleError::MissingRule(m.stake, m.players))?;
    let (pot, prize, fee) = split(&rule, m.humans());
    if prize > 0 {
        tx.lock_and_adjust(winner, prize)
            .await?
            .ok_or(SettleError::MissingAccount(winner))?;
        let entry = LedgerEntry::new(winner, prize, LedgerKind::Win, m.id.to_string());
        tx.append(&entry).await?;
    }
    if fee > 0 {
        match house(tx, m).await? {
            Some(merchant) => {
                tx.lock_and_adjust(merchant, fee)
                    .await?
                    .ok_or(SettleError::MissingAccount(merchant))?;
                let entry = LedgerEntry::new(merchant, fee, LedgerKind::Fee, m.id.to_string());
                tx.append(&entry).await?;
            }
            None => log::warn!("[settle] no merchant for {}, fee {} uncredited", m.id, fee),
        }
    }
    m.status = MatchStatus::Finished;
    m.winner = Some(winner);
    m.fee = fee;
    m.refundable = false;
    m.finished_at = Some(SystemTime::now());
    tx.update_match(m).await?;
    log::info!(
        "[settle] {} winner {} pot {} prize {} fee {}",
        m.id,
        winner,
        pot,
        prize,
        fee
    );
    Ok(())
}

/// Picks the account the house cut goes to: the match's merchant, then
/// the given fallback, skipping any candidate seated in the match. None
/// means the fee stays uncredited.
pub fn fee_recipient(m: &Match, fallback: Option<UserId>) -> Option<UserId> {
    m.merchant
        .filter(|&mid| !m.is_participant(mid))
        .or(fallback.filter(|&mid| !m.is_participant(mid)))
}

/// Resolves the house cut recipient, querying the system merchant fresh
/// when the match's own merchant is disqualified.
async fn house<C>(tx: &C, m: &Match) -> Result<Option<UserId>, SettleError>
where
    C: GenericClient + Sync,
{
    if let Some(merchant) = fee_recipient(m, None) {
        return Ok(Some(merchant));
    }
    if let Some(merchant) = m.merchant {
        log::warn!("[settle] match merchant {} is seated in {}", merchant, m.id);
    }
    Ok(fee_recipient(m, tx.merchant().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(stake: Chips, players: usize) -> Stake {
        Stake::catalog()
            .into_iter()
            .find(|r| r.stake == stake && r.players == players)
            .unwrap()
    }

    #[test]
    fn full_human_table_pays_configured_prize() {
        // stake=10, players=2: fee 5 each, pot 10, payout 8, house keeps 2
        let (pot, prize, fee) = split(&rule(10, 2), 2);
        assert_eq!((pot, prize, fee), (10, 8, 2));
    }
    #[test]
    fn agent_filled_table_caps_prize_at_pot() {
        // one human paid 5; payout 8 is capped so the fee stays at zero
        let (pot, prize, fee) = split(&rule(10, 2), 1);
        assert_eq!((pot, prize, fee), (5, 5, 0));
    }
    #[test]
    fn free_play_moves_nothing() {
        let (pot, prize, fee) = split(&rule(0, 3), 3);
        assert_eq!((pot, prize, fee), (0, 0, 0));
    }
    #[test]
    fn fee_never_negative_across_catalog() {
        for rule in Stake::catalog() {
            for humans in 0..=rule.players {
                let (pot, prize, fee) = split(&rule, humans);
                assert!(fee >= 0);
                assert!(prize <= pot);
            }
        }
    }

    fn pair(merchant: Option<UserId>) -> Match {
        let mut m = Match::open(UserId(1), 10, 2, merchant);
        m.slots[1] = Some(UserId(2));
        m.status = MatchStatus::Active;
        m
    }

    #[test]
    fn clean_merchant_collects_the_fee() {
        let m = pair(Some(UserId(-21)));
        assert_eq!(fee_recipient(&m, None), Some(UserId(-21)));
    }
    #[test]
    fn seated_merchant_falls_back_to_system_account() {
        // The match's recorded merchant somehow holds a seat; the fee
        // goes to the freshly-resolved system merchant instead.
        let m = pair(Some(UserId(2)));
        assert_eq!(fee_recipient(&m, Some(UserId(-21))), Some(UserId(-21)));
    }
    #[test]
    fn fee_never_goes_to_a_participant() {
        // Both candidates seated: the fee stays uncredited.
        let m = pair(Some(UserId(2)));
        assert_eq!(fee_recipient(&m, Some(UserId(1))), None);
        // No merchant recorded, fallback seated: still uncredited.
        let m = pair(None);
        assert_eq!(fee_recipient(&m, Some(UserId(2))), None);
    }
    #[test]
    fn missing_merchant_uses_fallback() {
        let m = pair(None);
        assert_eq!(fee_recipient(&m, Some(UserId(-21))), Some(UserId(-21)));
        assert_eq!(fee_recipient(&m, None), None);
    }
}
