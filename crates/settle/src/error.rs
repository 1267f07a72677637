use spin_core::*;
use spin_database::PgErr;

/// Why a settlement could not be performed.
///
/// Any of these aborts the caller's transaction, so a failed settlement
/// leaves the match ACTIVE and balances untouched.
#[derive(Debug)]
pub enum SettleError {
    /// No stake rule exists for the match's (stake, players) pair.
    MissingRule(Chips, usize),
    /// The winning slot is empty or maps to a non-human account.
    InvalidWinner(Slot),
    /// The winner's account row is missing at credit time.
    MissingAccount(UserId),
    Database(PgErr),
}

impl std::fmt::Display for SettleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRule(stake, players) => {
                write!(f, "no stake rule for stake {} with {} players", stake, players)
            }
            Self::InvalidWinner(slot) => {
                write!(f, "slot {} cannot be paid out", slot)
            }
            Self::MissingAccount(user) => {
                write!(f, "no account for winner {}", user)
            }
            Self::Database(e) => write!(f, "settlement database error: {}", e),
        }
    }
}

impl std::error::Error for SettleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PgErr> for SettleError {
    fn from(e: PgErr) -> Self {
        Self::Database(e)
    }
}
