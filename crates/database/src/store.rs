//! Store extension traits over [`tokio_postgres::GenericClient`].
//!
//! Implemented blanket-style so the same calls work on a plain [`Client`]
//! (autocommit reads) and inside a [`tokio_postgres::Transaction`]
//! (row-locked mutations). Every match mutation is expected to run inside
//! a transaction holding the match row lock.
use super::*;
use spin_core::*;
use spin_records::*;
use tokio_postgres::GenericClient;

/// SELECT list shared by every match query; order matches [`Load`] for
/// [`Match`].
const MATCH_COLUMNS: &str = "id, stake, players, p1, p2, p3, status, turn, last_roll, \
     forfeits, winner, merchant, fee, refundable, created_at, started_at, finished_at";

/// Identity and balance store.
///
/// All adjustments ride on `UPDATE … RETURNING`, which takes the row lock
/// implicitly, so concurrent debits serialize per account.
#[async_trait::async_trait]
pub trait Accounts {
    async fn account(&self, id: UserId) -> Result<Option<Account>, PgErr>;
    /// Guarded entry-fee debit: succeeds only when the balance covers the
    /// fee, atomically. Returns false on insufficient funds. A zero fee
    /// always succeeds without touching the row.
    async fn debit_entry(&self, id: UserId, fee: Chips) -> Result<bool, PgErr>;
    /// Row-locked balance adjustment; returns the new balance, or None
    /// for an unknown account.
    async fn lock_and_adjust(&self, id: UserId, delta: Chips) -> Result<Option<Chips>, PgErr>;
    /// Tops an account up to `floor` when below it (agent seating).
    async fn raise_floor(&self, id: UserId, floor: Chips) -> Result<(), PgErr>;
    /// Resolves the system merchant id fresh on every call; deliberately
    /// uncached so merchant rotation takes effect immediately.
    async fn merchant(&self) -> Result<Option<UserId>, PgErr>;
    /// Agent accounts not in `exclude`, in stable id order; callers
    /// shuffle for seating variety.
    async fn agents_excluding(&self, exclude: &[UserId]) -> Result<Vec<Account>, PgErr>;
    /// Idempotent account provisioning for setup.
    async fn ensure_account(&self, id: UserId, name: &str, balance: Chips) -> Result<(), PgErr>;
}

#[async_trait::async_trait]
impl<C> Accounts for C
where
    C: GenericClient + Sync,
{
    async fn account(&self, id: UserId) -> Result<Option<Account>, PgErr> {
        let sql = const_format::concatcp!("SELECT id, name, balance FROM ", USERS, " WHERE id = $1");
        Ok(self.query_opt(sql, &[&id.0]).await?.map(|r| Account::load(&r)))
    }
    async fn debit_entry(&self, id: UserId, fee: Chips) -> Result<bool, PgErr> {
        if fee <= 0 {
            return Ok(true);
        }
        let sql = const_format::concatcp!(
            "UPDATE ",
            USERS,
            " SET balance = balance - $2 WHERE id = $1 AND balance >= $2 RETURNING balance"
        );
        Ok(self.query_opt(sql, &[&id.0, &fee]).await?.is_some())
    }
    async fn lock_and_adjust(&self, id: UserId, delta: Chips) -> Result<Option<Chips>, PgErr> {
        let sql = const_format::concatcp!(
            "UPDATE ",
            USERS,
            " SET balance = balance + $2 WHERE id = $1 RETURNING balance"
        );
        Ok(self.query_opt(sql, &[&id.0, &delta]).await?.map(|r| r.get(0)))
    }
    async fn raise_floor(&self, id: UserId, floor: Chips) -> Result<(), PgErr> {
        let sql = const_format::concatcp!(
            "UPDATE ",
            USERS,
            " SET balance = $2 WHERE id = $1 AND balance < $2"
        );
        self.execute(sql, &[&id.0, &floor]).await?;
        Ok(())
    }
    async fn merchant(&self) -> Result<Option<UserId>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT id FROM ",
            USERS,
            " WHERE name = $1 ORDER BY id LIMIT 1"
        );
        Ok(self
            .query_opt(sql, &[&MERCHANT_NAME])
            .await?
            .map(|r| UserId(r.get(0))))
    }
    async fn agents_excluding(&self, exclude: &[UserId]) -> Result<Vec<Account>, PgErr> {
        let exclude = exclude.iter().map(|u| u.0).collect::<Vec<i64>>();
        // Pool range only; the merchant also carries a negative id but
        // is never seatable.
        let sql = const_format::concatcp!(
            "SELECT id, name, balance FROM ",
            USERS,
            " WHERE id BETWEEN $2 AND -1 AND NOT (id = ANY($1)) ORDER BY id"
        );
        Ok(self
            .query(sql, &[&exclude, &-AGENT_POOL_SIZE])
            .await?
            .iter()
            .map(Account::load)
            .collect())
    }
    async fn ensure_account(&self, id: UserId, name: &str, balance: Chips) -> Result<(), PgErr> {
        let sql = const_format::concatcp!(
            "INSERT INTO ",
            USERS,
            " (id, name, balance) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING"
        );
        self.execute(sql, &[&id.0, &name, &balance]).await?;
        Ok(())
    }
}

/// Durable match store: CRUD, row-lock-for-update, skip-locked scans,
/// creation-time ordering (UUIDv7 ids sort by creation time).
#[async_trait::async_trait]
pub trait Matches {
    async fn insert_match(&self, m: &Match) -> Result<(), PgErr>;
    async fn get_match(&self, id: ID<Match>) -> Result<Option<Match>, PgErr>;
    /// `SELECT … FOR UPDATE`: blocks until the per-match lock is held.
    /// Every mutation path goes through this inside its transaction.
    async fn lock_match(&self, id: ID<Match>) -> Result<Option<Match>, PgErr>;
    /// Oldest WAITING match with matching stake/players, a vacancy, and
    /// no slot owned by the caller. `SKIP LOCKED`: a row contended by a
    /// concurrent joiner is skipped so the caller falls through to
    /// creating a new match instead of queueing.
    async fn scan_joinable(
        &self,
        caller: UserId,
        stake: Chips,
        players: usize,
    ) -> Result<Option<Match>, PgErr>;
    /// WAITING matches older than `grace_secs`, oldest first.
    async fn stale_waiting(&self, grace_secs: u64, limit: i64) -> Result<Vec<ID<Match>>, PgErr>;
    async fn active_matches(&self) -> Result<Vec<Match>, PgErr>;
    /// Writes back every mutable column. Call sites hold the row lock.
    async fn update_match(&self, m: &Match) -> Result<(), PgErr>;
}

#[async_trait::async_trait]
impl<C> Matches for C
where
    C: GenericClient + Sync,
{
    async fn insert_match(&self, m: &Match) -> Result<(), PgErr> {
        let sql = const_format::concatcp!(
            "INSERT INTO ",
            MATCHES,
            " (",
            MATCH_COLUMNS,
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        let slot = |i: usize| m.slots[i].map(|u| u.0);
        let forfeits = m.forfeits.iter().map(|u| u.0).collect::<Vec<i64>>();
        self.execute(
            sql,
            &[
                &m.id.inner(),
                &m.stake,
                &(m.players as i16),
                &slot(0),
                &slot(1),
                &slot(2),
                &m.status.to_string(),
                &(m.turn as i16),
                &m.last_roll.map(|r| r as i16),
                &forfeits,
                &m.winner.map(|u| u.0),
                &m.merchant.map(|u| u.0),
                &m.fee,
                &m.refundable,
                &m.created_at,
                &m.started_at,
                &m.finished_at,
            ],
        )
        .await?;
        Ok(())
    }
    async fn get_match(&self, id: ID<Match>) -> Result<Option<Match>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT ",
            MATCH_COLUMNS,
            " FROM ",
            MATCHES,
            " WHERE id = $1"
        );
        Ok(self
            .query_opt(sql, &[&id.inner()])
            .await?
            .map(|r| Match::load(&r)))
    }
    async fn lock_match(&self, id: ID<Match>) -> Result<Option<Match>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT ",
            MATCH_COLUMNS,
            " FROM ",
            MATCHES,
            " WHERE id = $1 FOR UPDATE"
        );
        Ok(self
            .query_opt(sql, &[&id.inner()])
            .await?
            .map(|r| Match::load(&r)))
    }
    async fn scan_joinable(
        &self,
        caller: UserId,
        stake: Chips,
        players: usize,
    ) -> Result<Option<Match>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT ",
            MATCH_COLUMNS,
            " FROM ",
            MATCHES,
            " WHERE status = 'WAITING'
               AND stake = $1
               AND players = $2
               AND p1 IS DISTINCT FROM $3
               AND p2 IS DISTINCT FROM $3
               AND p3 IS DISTINCT FROM $3
               AND (p1 IS NULL OR p2 IS NULL OR (players >= 3 AND p3 IS NULL))
             ORDER BY id ASC
             LIMIT 1
             FOR UPDATE SKIP LOCKED"
        );
        Ok(self
            .query_opt(sql, &[&stake, &(players as i16), &caller.0])
            .await?
            .map(|r| Match::load(&r)))
    }
    async fn stale_waiting(&self, grace_secs: u64, limit: i64) -> Result<Vec<ID<Match>>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT id FROM ",
            MATCHES,
            " WHERE status = 'WAITING'
               AND created_at <= now() - ($1::DOUBLE PRECISION * interval '1 second')
             ORDER BY created_at ASC
             LIMIT $2"
        );
        Ok(self
            .query(sql, &[&(grace_secs as f64), &limit])
            .await?
            .iter()
            .map(|r| ID::from(r.get::<_, uuid::Uuid>(0)))
            .collect())
    }
    async fn active_matches(&self) -> Result<Vec<Match>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT ",
            MATCH_COLUMNS,
            " FROM ",
            MATCHES,
            " WHERE status = 'ACTIVE' ORDER BY id ASC"
        );
        Ok(self.query(sql, &[]).await?.iter().map(Match::load).collect())
    }
    async fn update_match(&self, m: &Match) -> Result<(), PgErr> {
        let sql = const_format::concatcp!(
            "UPDATE ",
            MATCHES,
            " SET p1 = $2, p2 = $3, p3 = $4, status = $5, turn = $6, last_roll = $7,
                   forfeits = $8, winner = $9, merchant = $10, fee = $11,
                   refundable = $12, started_at = $13, finished_at = $14
             WHERE id = $1"
        );
        let slot = |i: usize| m.slots[i].map(|u| u.0);
        let forfeits = m.forfeits.iter().map(|u| u.0).collect::<Vec<i64>>();
        self.execute(
            sql,
            &[
                &m.id.inner(),
                &slot(0),
                &slot(1),
                &slot(2),
                &m.status.to_string(),
                &(m.turn as i16),
                &m.last_roll.map(|r| r as i16),
                &forfeits,
                &m.winner.map(|u| u.0),
                &m.merchant.map(|u| u.0),
                &m.fee,
                &m.refundable,
                &m.started_at,
                &m.finished_at,
            ],
        )
        .await?;
        Ok(())
    }
}

/// Append-only ledger sink. Rows are written inside the same transaction
/// as the balance mutation they record.
#[async_trait::async_trait]
pub trait Ledger {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), PgErr>;
}

#[async_trait::async_trait]
impl<C> Ledger for C
where
    C: GenericClient + Sync,
{
    async fn append(&self, entry: &LedgerEntry) -> Result<(), PgErr> {
        let sql = const_format::concatcp!(
            "INSERT INTO ",
            LEDGER,
            " (id, user_id, amount, kind, status, reference) VALUES ($1, $2, $3, $4, $5, $6)"
        );
        self.execute(
            sql,
            &[
                &entry.id.inner(),
                &entry.user.0,
                &entry.amount,
                &entry.kind.to_string(),
                &entry.status.to_string(),
                &entry.reference,
            ],
        )
        .await?;
        Ok(())
    }
}

/// Stake rule lookup over the immutable catalog table.
#[async_trait::async_trait]
pub trait Stakes {
    async fn stake_rule(&self, stake: Chips, players: usize) -> Result<Option<Stake>, PgErr>;
    async fn stake_rules(&self) -> Result<Vec<Stake>, PgErr>;
}

#[async_trait::async_trait]
impl<C> Stakes for C
where
    C: GenericClient + Sync,
{
    async fn stake_rule(&self, stake: Chips, players: usize) -> Result<Option<Stake>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT stake, players, entry_fee, winner_payout, label FROM ",
            STAKES,
            " WHERE stake = $1 AND players = $2"
        );
        Ok(self
            .query_opt(sql, &[&stake, &(players as i16)])
            .await?
            .map(|r| Stake::load(&r)))
    }
    async fn stake_rules(&self) -> Result<Vec<Stake>, PgErr> {
        let sql = const_format::concatcp!(
            "SELECT stake, players, entry_fee, winner_payout, label FROM ",
            STAKES,
            " ORDER BY players ASC, stake ASC"
        );
        Ok(self.query(sql, &[]).await?.iter().map(Stake::load).collect())
    }
}
