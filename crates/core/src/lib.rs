//! Core type aliases, identity types, and constants for spindice.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the spindice workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Wallet balances, entry fees, pots, and payouts.
pub type Chips = i64;
/// Seat index within a match (0 = creator).
pub type Slot = usize;
/// Board cell index. 0 is the start cell; 7 is the winning cell.
pub type Cell = u8;

// ============================================================================
// TRAITS
// ============================================================================
/// Random instance generation for dice, starting turns, and tests.
pub trait Arbitrary {
    /// Generate a uniformly random instance.
    fn random() -> Self;
}

/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
///
/// Uses UUIDv7, so ascending id order is creation-time order. The waiting
/// match scan relies on this for oldest-first joining.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

// serde passes straight through to the UUID; the marker is compile-time
// only.
impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

/// Account identity shared with the external identity/balance provider.
///
/// Humans carry positive ids assigned at registration. House-controlled
/// agent accounts carry negative ids so pot math can tell them apart
/// without a join.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Paying players. Only these count toward the pot and may win it.
    pub fn is_human(&self) -> bool {
        self.0 > 0
    }
    /// House-controlled accounts seated by the backfill service.
    pub fn is_agent(&self) -> bool {
        self.0 < 0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

// ============================================================================
// BOARD PARAMETERS
// ============================================================================
/// Winning cell. Landing exactly here ends the match.
pub const BOARD_MAX: Cell = 7;
/// Danger cell. Landing exactly here resets the token to the start cell.
pub const DANGER_CELL: Cell = 3;
/// Die faces are 1..=DIE_FACES.
pub const DIE_FACES: Cell = 6;
/// Rolling this spawns an off-board token onto the start cell.
pub const SPAWN_ROLL: Cell = 1;
/// Smallest supported match size.
pub const MIN_PLAYERS: usize = 2;
/// Largest supported match size.
pub const MAX_PLAYERS: usize = 3;

// ============================================================================
// LIFECYCLE TIMING
// ============================================================================
/// Seconds of inactivity before the supervisor rolls on an idle player's behalf.
pub const TURN_TIMEOUT_SECS: u64 = 10;
/// Seconds a WAITING match may sit unfilled before agents are seated.
pub const BACKFILL_GRACE_SECS: u64 = 10;
/// Base interval between backfill scans.
pub const FILLER_INTERVAL_SECS: u64 = 3;
/// Autoplay scans wait a uniform 5..=7 seconds between passes.
pub const AUTOPLAY_INTERVAL_SECS: (u64, u64) = (5, 7);
/// Supervisor sweep jitter bounds, seconds.
pub const SWEEP_INTERVAL_SECS: (u64, u64) = (3, 7);
/// Live snapshots expire after a day; the durable record outlives them.
pub const LIVE_TTL_SECS: u64 = 24 * 60 * 60;
/// Stale scans touch at most this many matches per pass.
pub const SCAN_LIMIT: i64 = 20;

// ============================================================================
// HOUSE ACCOUNTS
// ============================================================================
/// Balance floor applied to agent accounts before seating.
pub const AGENT_MIN_BALANCE: Chips = 50;
/// Number of agent accounts provisioned at startup (ids -1..=-AGENT_POOL_SIZE).
pub const AGENT_POOL_SIZE: i64 = 20;
/// Display name of the system merchant account that collects house fees.
pub const MERCHANT_NAME: &str = "System Merchant";

/// The fixed pool of agent account ids.
pub fn agent_pool() -> impl Iterator<Item = UserId> {
    (1..=AGENT_POOL_SIZE).map(|i| UserId(-i))
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn user_id_sign_convention() {
        assert!(UserId(42).is_human());
        assert!(!UserId(42).is_agent());
        assert!(UserId(-3).is_agent());
        assert!(!UserId(-3).is_human());
        assert!(!UserId(0).is_human());
        assert!(!UserId(0).is_agent());
    }
    #[test]
    fn agent_pool_is_negative_and_sized() {
        let pool = agent_pool().collect::<Vec<_>>();
        assert_eq!(pool.len(), AGENT_POOL_SIZE as usize);
        assert!(pool.iter().all(UserId::is_agent));
    }
    #[test]
    fn ids_are_time_ordered() {
        struct Marker;
        let a = ID::<Marker>::default();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = ID::<Marker>::default();
        assert!(a < b);
    }
}
