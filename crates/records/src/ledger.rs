use spin_core::*;

/// What a ledger row records.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Entry,
    Win,
    Fee,
    Recharge,
    Withdraw,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Success,
    Failed,
}

/// One append-only money movement, written in the same transaction as the
/// balance mutation it records so a crash cannot separate the two.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
    pub id: ID<LedgerEntry>,
    pub user: UserId,
    pub amount: Chips,
    pub kind: LedgerKind,
    pub status: LedgerStatus,
    pub reference: String,
}

impl LedgerEntry {
    pub fn new(user: UserId, amount: Chips, kind: LedgerKind, reference: String) -> Self {
        Self {
            id: ID::default(),
            user,
            amount,
            kind,
            status: LedgerStatus::Success,
            reference,
        }
    }
}

impl Unique for LedgerEntry {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Win => write!(f, "win"),
            Self::Fee => write!(f, "fee"),
            Self::Recharge => write!(f, "recharge"),
            Self::Withdraw => write!(f, "withdraw"),
        }
    }
}

impl std::str::FromStr for LedgerKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(Self::Entry),
            "win" => Ok(Self::Win),
            "fee" => Ok(Self::Fee),
            "recharge" => Ok(Self::Recharge),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(format!("unknown ledger kind: {}", other)),
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for LedgerStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown ledger status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn kind_round_trips_as_text() {
        for kind in [
            LedgerKind::Entry,
            LedgerKind::Win,
            LedgerKind::Fee,
            LedgerKind::Recharge,
            LedgerKind::Withdraw,
        ] {
            assert_eq!(kind.to_string().parse::<LedgerKind>(), Ok(kind));
        }
    }
}
