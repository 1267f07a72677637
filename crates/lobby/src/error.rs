use spin_database::PgErr;
use spin_settle::SettleError;

/// Domain errors surfaced by match operations.
///
/// Each variant maps to one HTTP status in the server crate. Lock
/// contention on the join scan never appears here: contended rows are
/// skipped and the caller falls through to creating a match.
#[derive(Debug)]
pub enum MatchError {
    /// Malformed request: unknown stake rule, bad player count.
    Validation(String),
    /// The caller is not allowed to act: not a participant, already
    /// forfeited, not the creator.
    Authorization(String),
    /// The guarded entry-fee debit found an insufficient balance.
    InsufficientFunds,
    /// Valid request, wrong state: match not active, not the caller's
    /// turn, match already full.
    Conflict(String),
    /// A required collaborator is unreachable.
    Unavailable(String),
    Settlement(SettleError),
    NotFound,
    Database(PgErr),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "invalid request: {}", msg),
            Self::Authorization(msg) => write!(f, "not allowed: {}", msg),
            Self::InsufficientFunds => write!(f, "insufficient balance for entry fee"),
            Self::Conflict(msg) => write!(f, "conflict: {}", msg),
            Self::Unavailable(msg) => write!(f, "unavailable: {}", msg),
            Self::Settlement(e) => write!(f, "settlement failed: {}", e),
            Self::NotFound => write!(f, "no such match"),
            Self::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Settlement(e) => Some(e),
            Self::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PgErr> for MatchError {
    fn from(e: PgErr) -> Self {
        Self::Database(e)
    }
}
impl From<SettleError> for MatchError {
    fn from(e: SettleError) -> Self {
        match e {
            SettleError::Database(e) => Self::Database(e),
            other => Self::Settlement(other),
        }
    }
}
