use rand::Rng;
use spin_core::*;
use std::time::SystemTime;

/// External status vocabulary for a match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Waiting,
    Active,
    Finished,
    Abandoned,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Finished => write!(f, "FINISHED"),
            Self::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING" => Ok(Self::Waiting),
            "ACTIVE" => Ok(Self::Active),
            "FINISHED" => Ok(Self::Finished),
            "ABANDONED" => Ok(Self::Abandoned),
            other => Err(format!("unknown match status: {}", other)),
        }
    }
}

/// Durable record of one dice match.
///
/// Slots are ordered; slot 0 is the creator. Only the first `players`
/// entries of `slots` are meaningful. Forfeited occupants keep their slot
/// for history and are excluded from play via `forfeits`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Match {
    pub id: ID<Match>,
    pub stake: Chips,
    pub players: usize,
    pub slots: [Option<UserId>; MAX_PLAYERS],
    pub status: MatchStatus,
    pub turn: Slot,
    pub last_roll: Option<Cell>,
    pub forfeits: Vec<UserId>,
    pub winner: Option<UserId>,
    pub merchant: Option<UserId>,
    pub fee: Chips,
    pub refundable: bool,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
}

impl Match {
    /// A fresh WAITING match with the creator in slot 0 and a random
    /// starting turn already drawn.
    pub fn open(creator: UserId, stake: Chips, players: usize, merchant: Option<UserId>) -> Self {
        let mut slots = [None; MAX_PLAYERS];
        slots[0] = Some(creator);
        Self {
            id: ID::default(),
            stake,
            players,
            slots,
            status: MatchStatus::Waiting,
            turn: Self::draw_turn(players),
            last_roll: None,
            forfeits: Vec::new(),
            winner: None,
            merchant,
            fee: 0,
            refundable: true,
            created_at: SystemTime::now(),
            started_at: None,
            finished_at: None,
        }
    }
    /// Uniformly random starting turn among slot indices.
    pub fn draw_turn(players: usize) -> Slot {
        rand::rng().random_range(0..players)
    }
    /// The meaningful slots, in order.
    pub fn seats(&self) -> &[Option<UserId>] {
        &self.slots[..self.players]
    }
    pub fn occupant(&self, slot: Slot) -> Option<UserId> {
        self.seats().get(slot).copied().flatten()
    }
    pub fn slot_of(&self, user: UserId) -> Option<Slot> {
        self.seats().iter().position(|&uid| uid == Some(user))
    }
    pub fn is_participant(&self, user: UserId) -> bool {
        self.slot_of(user).is_some()
    }
    /// First empty slot, if any.
    pub fn vacancy(&self) -> Option<Slot> {
        self.seats().iter().position(Option::is_none)
    }
    pub fn is_full(&self) -> bool {
        self.vacancy().is_none()
    }
    pub fn occupied(&self) -> usize {
        self.seats().iter().flatten().count()
    }
    /// Occupied slots whose owner has not forfeited; the set the turn
    /// pointer is allowed to reference while ACTIVE.
    pub fn active_slots(&self) -> Vec<Slot> {
        self.seats()
            .iter()
            .enumerate()
            .filter(|(_, uid)| uid.map(|u| !self.forfeits.contains(&u)).unwrap_or(false))
            .map(|(i, _)| i)
            .collect()
    }
    /// Paying human occupants; the pot is their entry fees and only they
    /// may be paid out.
    pub fn humans(&self) -> usize {
        self.seats().iter().flatten().filter(|u| u.is_human()).count()
    }
    pub fn has_human(&self) -> bool {
        self.seats().iter().flatten().any(|u| u.is_human())
    }
    /// Walks round-robin from `from` (exclusive) to the next active slot.
    /// Falls back to the lowest active slot when `from` leads nowhere,
    /// and to `from` itself when no slot is active at all.
    pub fn next_active(&self, from: Slot) -> Slot {
        let active = self.active_slots();
        let mut next = (from + 1) % self.players;
        for _ in 0..self.players {
            if active.contains(&next) {
                return next;
            }
            next = (next + 1) % self.players;
        }
        active.first().copied().unwrap_or(from)
    }
    /// Clamps the stored turn onto the active set: lowest active slot when
    /// the pointer references a forfeited or empty seat.
    pub fn live_turn(&self) -> Slot {
        let active = self.active_slots();
        if active.contains(&self.turn) {
            self.turn
        } else {
            active.first().copied().unwrap_or(self.turn)
        }
    }
    /// Age of the match, saturating at zero.
    pub fn age(&self) -> std::time::Duration {
        SystemTime::now()
            .duration_since(self.created_at)
            .unwrap_or_default()
    }
}

impl Unique for Match {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_pair() -> Match {
        let mut m = Match::open(UserId(1), 10, 2, None);
        m.slots[1] = Some(UserId(2));
        m.status = MatchStatus::Active;
        m
    }

    #[test]
    fn open_match_has_creator_and_vacancy() {
        let m = Match::open(UserId(7), 10, 2, None);
        assert_eq!(m.status, MatchStatus::Waiting);
        assert_eq!(m.occupant(0), Some(UserId(7)));
        assert_eq!(m.vacancy(), Some(1));
        assert!(m.turn < 2);
    }
    #[test]
    fn seats_respect_player_count() {
        let m = Match::open(UserId(7), 10, 2, None);
        assert_eq!(m.seats().len(), 2);
        let m = Match::open(UserId(7), 10, 3, None);
        assert_eq!(m.seats().len(), 3);
        assert_eq!(m.vacancy(), Some(1));
    }
    #[test]
    fn forfeits_shrink_active_set() {
        let mut m = active_pair();
        assert_eq!(m.active_slots(), vec![0, 1]);
        m.forfeits.push(UserId(1));
        assert_eq!(m.active_slots(), vec![1]);
        m.forfeits.push(UserId(2));
        assert!(m.active_slots().is_empty());
    }
    #[test]
    fn next_active_skips_forfeited() {
        let mut m = Match::open(UserId(1), 10, 3, None);
        m.slots[1] = Some(UserId(2));
        m.slots[2] = Some(UserId(3));
        m.forfeits.push(UserId(2));
        assert_eq!(m.next_active(0), 2);
        assert_eq!(m.next_active(2), 0);
    }
    #[test]
    fn live_turn_retargets_to_lowest_active() {
        let mut m = active_pair();
        m.turn = 0;
        m.forfeits.push(UserId(1));
        assert_eq!(m.live_turn(), 1);
    }
    #[test]
    fn humans_exclude_agents() {
        let mut m = active_pair();
        m.slots[1] = Some(UserId(-4));
        assert_eq!(m.humans(), 1);
        assert!(m.has_human());
        m.slots[0] = Some(UserId(-5));
        assert!(!m.has_human());
    }
    #[test]
    fn status_round_trips_as_text() {
        for status in [
            MatchStatus::Waiting,
            MatchStatus::Active,
            MatchStatus::Finished,
            MatchStatus::Abandoned,
        ] {
            assert_eq!(status.to_string().parse::<MatchStatus>(), Ok(status));
        }
    }
}
