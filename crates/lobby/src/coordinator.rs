use super::*;
use spin_board::*;
use spin_core::*;
use spin_database::*;
use spin_live::*;
use spin_records::*;
use std::time::SystemTime;
use tokio_postgres::GenericClient;

/// Wire-facing view of a match, derived from the durable record.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Summary {
    pub match_id: ID<Match>,
    pub status: MatchStatus,
    pub stake: Chips,
    pub players: usize,
    pub slots: Vec<Option<UserId>>,
    pub turn: Slot,
    pub last_roll: Option<Cell>,
    pub winner: Option<UserId>,
    pub forfeits: Vec<UserId>,
}

impl Summary {
    pub fn of(m: &Match) -> Self {
        Self {
            match_id: m.id,
            status: m.status,
            stake: m.stake,
            players: m.players,
            slots: m.seats().to_vec(),
            turn: m.live_turn(),
            last_roll: m.last_roll,
            winner: m.winner,
            forfeits: m.forfeits.clone(),
        }
    }
}

/// Match lock coordinator.
///
/// Every mutation opens one connection, takes the per-match row lock
/// inside a transaction, validates, mutates, settles if needed, and
/// commits before touching the live layer. The live layer is advisory:
/// its writes happen after commit and its failures only log.
#[derive(Clone)]
pub struct Lobby {
    pub(crate) db: Db,
    pub(crate) live: Live,
}

impl Lobby {
    pub fn new(db: Db, live: Live) -> Self {
        Self { db, live }
    }
    pub fn db(&self) -> &Db {
        &self.db
    }
    pub fn live(&self) -> &Live {
        &self.live
    }

    /// Seats the caller in the oldest joinable WAITING match, or creates
    /// a fresh one. Returns the resulting view and whether an existing
    /// match was joined.
    ///
    /// The scan skips row-locked matches, so contention falls through to
    /// creation instead of blocking. The entry fee is debited exactly
    /// once, here, at slot occupation.
    pub async fn create_or_join(
        &self,
        caller: Caller,
        stake: Chips,
        players: usize,
    ) -> Result<(Summary, bool), MatchError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
            return Err(MatchError::Validation(format!(
                "unsupported player count {}",
                players
            )));
        }
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        let rule = tx
            .stake_rule(stake, players)
            .await?
            .ok_or_else(|| MatchError::Validation(format!("no stake rule for {}", stake)))?;
        match tx.scan_joinable(caller.id(), stake, players).await? {
            Some(mut m) => {
                charge(&tx, caller.id(), rule.entry_fee, m.id).await?;
                let slot = m
                    .vacancy()
                    .ok_or_else(|| MatchError::Conflict(String::from("match already full")))?;
                m.slots[slot] = Some(caller.id());
                if m.is_full() {
                    m.status = MatchStatus::Active;
                    m.turn = Match::draw_turn(m.players);
                    m.started_at = Some(SystemTime::now());
                }
                tx.update_match(&m).await?;
                tx.commit().await?;
                self.live.write(m.id, &LiveState::seed(&m)).await;
                log::info!("[lobby] {} joined {} at slot {}", caller, m.id, slot);
                Ok((Summary::of(&m), true))
            }
            None => {
                let merchant = tx.merchant().await?.filter(|&mid| mid != caller.id());
                let m = Match::open(caller.id(), stake, players, merchant);
                charge(&tx, caller.id(), rule.entry_fee, m.id).await?;
                tx.insert_match(&m).await?;
                tx.commit().await?;
                self.live.write(m.id, &LiveState::seed(&m)).await;
                log::info!("[lobby] {} opened {} ({} seats)", caller, m.id, players);
                Ok((Summary::of(&m), false))
            }
        }
    }

    /// Applies one roll for the caller. Validates participation, turn
    /// ownership, and liveness under the row lock; a winning roll settles
    /// inside the same transaction.
    pub async fn roll(&self, caller: Caller, id: ID<Match>) -> Result<Summary, MatchError> {
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        let mut m = tx.lock_match(id).await?.ok_or(MatchError::NotFound)?;
        if m.status != MatchStatus::Active {
            return Err(MatchError::Conflict(format!("match is {}", m.status)));
        }
        let slot = m
            .slot_of(caller.id())
            .ok_or_else(|| MatchError::Authorization(String::from("not a participant")))?;
        if m.forfeits.contains(&caller.id()) {
            return Err(MatchError::Authorization(String::from("already forfeited")));
        }
        // Out-of-turn is a state conflict (409), not an authorization
        // failure: the seat is legitimate, the timing is not.
        if slot != m.live_turn() {
            return Err(MatchError::Conflict(String::from("not your turn")));
        }
        let mut live = self
            .live
            .read(id)
            .await
            .unwrap_or_else(|| LiveState::seed(&m));
        let roll = Roll::random();
        let finished = apply_turn(&tx, &mut m, &mut live, slot, roll).await?;
        tx.commit().await?;
        self.live.write(id, &live).await;
        if finished {
            self.live.clear(id).await;
        }
        log::info!("[lobby] {} rolled {} in {}", caller, roll, id);
        Ok(Summary::of(&m))
    }

    /// Withdraws the caller from an ACTIVE match. A single surviving
    /// active player wins by walkover; zero survivors abandons the match
    /// with no settlement.
    pub async fn forfeit(&self, caller: Caller, id: ID<Match>) -> Result<Summary, MatchError> {
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        let mut m = tx.lock_match(id).await?.ok_or(MatchError::NotFound)?;
        if m.status != MatchStatus::Active {
            return Err(MatchError::Conflict(format!("match is {}", m.status)));
        }
        let slot = m
            .slot_of(caller.id())
            .ok_or_else(|| MatchError::Authorization(String::from("not a participant")))?;
        if m.forfeits.contains(&caller.id()) {
            return Err(MatchError::Authorization(String::from("already forfeited")));
        }
        m.forfeits.push(caller.id());
        let active = m.active_slots();
        match active.as_slice() {
            [] => {
                m.status = MatchStatus::Abandoned;
                m.refundable = false;
                m.finished_at = Some(SystemTime::now());
                tx.update_match(&m).await?;
                log::info!("[lobby] {} emptied {} by forfeit, abandoned", caller, id);
            }
            [survivor] => match m.occupant(*survivor).filter(UserId::is_human) {
                Some(_) => spin_settle::distribute_prize(&tx, &mut m, *survivor).await?,
                None => {
                    // Agent walkover: finish without payout.
                    m.status = MatchStatus::Finished;
                    m.winner = m.occupant(*survivor);
                    m.refundable = false;
                    m.finished_at = Some(SystemTime::now());
                    tx.update_match(&m).await?;
                }
            },
            _ => {
                m.turn = m.live_turn();
                tx.update_match(&m).await?;
            }
        }
        tx.commit().await?;
        let mut live = self
            .live
            .read(id)
            .await
            .unwrap_or_else(|| LiveState::seed(&m));
        live.winner = m.winner;
        live.stamp();
        live.sync(&m);
        self.live.write(id, &live).await;
        if m.status != MatchStatus::Active {
            self.live.clear(id).await;
        }
        log::info!("[lobby] {} forfeited slot {} in {}", caller, slot, id);
        Ok(Summary::of(&m))
    }

    /// Creator cancels an unstarted match. Collected entry fees are
    /// refunded while the match is still marked refundable.
    pub async fn abandon(&self, caller: Caller, id: ID<Match>) -> Result<Summary, MatchError> {
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        let mut m = tx.lock_match(id).await?.ok_or(MatchError::NotFound)?;
        if m.occupant(0) != Some(caller.id()) {
            return Err(MatchError::Authorization(String::from(
                "only the creator may abandon",
            )));
        }
        if m.status != MatchStatus::Waiting {
            return Err(MatchError::Conflict(format!("match is {}", m.status)));
        }
        if m.refundable {
            if let Some(rule) = tx.stake_rule(m.stake, m.players).await? {
                if rule.entry_fee > 0 {
                    for occupant in m.seats().iter().flatten() {
                        tx.lock_and_adjust(*occupant, rule.entry_fee).await?;
                        let entry = LedgerEntry::new(
                            *occupant,
                            rule.entry_fee,
                            LedgerKind::Entry,
                            format!("{}:refund", m.id),
                        );
                        tx.append(&entry).await?;
                    }
                }
            }
        }
        m.status = MatchStatus::Abandoned;
        m.refundable = false;
        m.finished_at = Some(SystemTime::now());
        tx.update_match(&m).await?;
        tx.commit().await?;
        let mut live = self
            .live
            .read(id)
            .await
            .unwrap_or_else(|| LiveState::seed(&m));
        live.sync(&m);
        self.live.write(id, &live).await;
        self.live.clear(id).await;
        log::info!("[lobby] {} abandoned {}", caller, id);
        Ok(Summary::of(&m))
    }

    /// Idempotent poll. Promotes a full WAITING match to ACTIVE, runs the
    /// timeout check on ACTIVE matches, and returns the current view.
    pub async fn check_status(&self, id: ID<Match>) -> Result<Summary, MatchError> {
        self.promote_if_full(id).await?;
        self.advance_if_stalled(id).await?;
        let client = self.db.conn().await?;
        let m = client.get_match(id).await?.ok_or(MatchError::NotFound)?;
        Ok(Summary::of(&m))
    }

    /// Flips a fully-seated WAITING match to ACTIVE with a fresh random
    /// starting turn. Covers matches filled by paths that crashed before
    /// their own promotion.
    pub async fn promote_if_full(&self, id: ID<Match>) -> Result<(), MatchError> {
        let mut client = self.db.conn().await?;
        let tx = client.transaction().await?;
        if let Some(mut m) = tx.lock_match(id).await? {
            if m.status == MatchStatus::Waiting && m.is_full() {
                m.status = MatchStatus::Active;
                m.turn = Match::draw_turn(m.players);
                m.started_at = Some(SystemTime::now());
                tx.update_match(&m).await?;
                tx.commit().await?;
                self.live.write(id, &LiveState::seed(&m)).await;
                log::info!("[lobby] promoted {} to ACTIVE", id);
            }
        }
        Ok(())
    }
}

/// Debits the entry fee exactly once and records it, inside the caller's
/// transaction. A zero fee charges nothing and writes nothing.
pub async fn charge<C>(
    tx: &C,
    payer: UserId,
    fee: Chips,
    id: ID<Match>,
) -> Result<(), MatchError>
where
    C: GenericClient + Sync,
{
    if fee <= 0 {
        return Ok(());
    }
    if !tx.debit_entry(payer, fee).await? {
        return Err(MatchError::InsufficientFunds);
    }
    let entry = LedgerEntry::new(payer, -fee, LedgerKind::Entry, id.to_string());
    tx.append(&entry).await?;
    Ok(())
}

/// Applies one validated roll to the durable record and the live
/// snapshot. A win settles in place; otherwise the turn advances past
/// forfeited seats. Returns whether the match finished.
pub(crate) async fn apply_turn<C>(
    tx: &C,
    m: &mut Match,
    live: &mut LiveState,
    slot: Slot,
    roll: Roll,
) -> Result<bool, MatchError>
where
    C: GenericClient + Sync,
{
    let mut board = Board::from_parts(live.positions.clone(), live.spawned.clone());
    let outcome = board.apply(slot, roll);
    m.last_roll = Some(roll.pips());
    let finished = match outcome.winner {
        Some(winner) => {
            spin_settle::distribute_prize(tx, m, winner).await?;
            true
        }
        None => {
            m.turn = m.next_active(slot);
            tx.update_match(m).await?;
            false
        }
    };
    live.positions = board.positions().to_vec();
    live.spawned = board.spawned().to_vec();
    live.reverse = outcome.reverse;
    live.spawn = outcome.spawn;
    live.capture = outcome.capture;
    live.actor = Some(slot);
    live.winner = m.winner;
    live.turn_count += 1;
    live.stamp();
    live.sync(m);
    Ok(finished)
}
