//! Database schema implementations for domain records.
//!
//! Implements Schema/Derive/Load directly on types from spin-records.
//! This is possible because the traits are local to this crate.
use super::*;
use spin_core::*;
use spin_records::*;
use tokio_postgres::Row;

impl Schema for Match {
    fn name() -> &'static str {
        MATCHES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            MATCHES,
            " (
                id          UUID PRIMARY KEY,
                stake       BIGINT NOT NULL,
                players     SMALLINT NOT NULL,
                p1          BIGINT,
                p2          BIGINT,
                p3          BIGINT,
                status      TEXT NOT NULL,
                turn        SMALLINT NOT NULL DEFAULT 0,
                last_roll   SMALLINT,
                forfeits    BIGINT[] NOT NULL DEFAULT '{}',
                winner      BIGINT,
                merchant    BIGINT,
                fee         BIGINT NOT NULL DEFAULT 0,
                refundable  BOOLEAN NOT NULL DEFAULT TRUE,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                started_at  TIMESTAMPTZ,
                finished_at TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            MATCHES,
            "_scan ON ",
            MATCHES,
            " (status, stake, players, id);
             CREATE INDEX IF NOT EXISTS idx_",
            MATCHES,
            "_age ON ",
            MATCHES,
            " (status, created_at);"
        )
    }
}

/// Column order must match [`MATCH_COLUMNS`] in the store queries.
impl Load for Match {
    fn load(row: &Row) -> Self {
        let user = |i: usize| row.get::<_, Option<i64>>(i).map(UserId);
        let status: String = row.get(6);
        Self {
            id: ID::from(row.get::<_, uuid::Uuid>(0)),
            stake: row.get(1),
            players: row.get::<_, i16>(2) as usize,
            slots: [user(3), user(4), user(5)],
            status: status.parse().expect("valid match status"),
            turn: row.get::<_, i16>(7) as Slot,
            last_roll: row.get::<_, Option<i16>>(8).map(|r| r as Cell),
            forfeits: row
                .get::<_, Vec<i64>>(9)
                .into_iter()
                .map(UserId)
                .collect(),
            winner: row.get::<_, Option<i64>>(10).map(UserId),
            merchant: row.get::<_, Option<i64>>(11).map(UserId),
            fee: row.get(12),
            refundable: row.get(13),
            created_at: row.get(14),
            started_at: row.get(15),
            finished_at: row.get(16),
        }
    }
}

impl Schema for Account {
    fn name() -> &'static str {
        USERS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            USERS,
            " (
                id          BIGINT PRIMARY KEY,
                name        TEXT,
                balance     BIGINT NOT NULL DEFAULT 0,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            USERS,
            "_name ON ",
            USERS,
            " (name);"
        )
    }
}

impl Load for Account {
    fn load(row: &Row) -> Self {
        Self {
            id: UserId(row.get(0)),
            name: row.get(1),
            balance: row.get(2),
        }
    }
}

impl Schema for LedgerEntry {
    fn name() -> &'static str {
        LEDGER
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            LEDGER,
            " (
                id          UUID PRIMARY KEY,
                user_id     BIGINT NOT NULL,
                amount      BIGINT NOT NULL,
                kind        TEXT NOT NULL,
                status      TEXT NOT NULL,
                reference   TEXT,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            LEDGER,
            "_user ON ",
            LEDGER,
            " (user_id, created_at);"
        )
    }
}

impl Schema for Stake {
    fn name() -> &'static str {
        STAKES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            STAKES,
            " (
                stake         BIGINT NOT NULL,
                players       SMALLINT NOT NULL,
                entry_fee     BIGINT NOT NULL,
                winner_payout BIGINT NOT NULL,
                label         TEXT NOT NULL,
                PRIMARY KEY (stake, players)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Derive for Stake {
    fn exhaust() -> Vec<Self> {
        Stake::catalog()
    }
    fn inserts(&self) -> String {
        format!(
            "INSERT INTO {} (stake, players, entry_fee, winner_payout, label) \
             VALUES ({}, {}, {}, {}, '{}') ON CONFLICT DO NOTHING;",
            STAKES, self.stake, self.players, self.entry_fee, self.winner_payout, self.label
        )
    }
}

impl Load for Stake {
    fn load(row: &Row) -> Self {
        Self {
            stake: row.get(0),
            players: row.get::<_, i16>(1) as usize,
            entry_fee: row.get(2),
            winner_payout: row.get(3),
            label: row.get(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn stake_seed_is_idempotent_sql() {
        let sql = Stake::derives();
        assert!(sql.contains("ON CONFLICT DO NOTHING"));
        assert_eq!(sql.matches("INSERT INTO").count(), Stake::exhaust().len());
    }
    #[test]
    fn ddl_names_every_table() {
        assert!(Match::creates().contains(MATCHES));
        assert!(Account::creates().contains(USERS));
        assert!(LedgerEntry::creates().contains(LEDGER));
        assert!(Stake::creates().contains(STAKES));
    }
}
