use spin_core::*;
use spin_records::*;

/// Ephemeral per-match snapshot mirrored to Redis and streamed to
/// spectators. Rebuildable from the durable record at any time; nothing
/// that moves money reads from here.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LiveState {
    /// Token cells per slot. 0 is the start cell (also the unspawned
    /// parking cell).
    pub positions: Vec<Cell>,
    /// Whether each slot's token is on the board. Older snapshots may
    /// omit this; absent means nobody has spawned.
    #[serde(default)]
    pub spawned: Vec<bool>,
    pub current_turn: Slot,
    pub last_roll: Option<Cell>,
    pub winner: Option<UserId>,
    /// Per-roll event flags, valid for the most recent roll only.
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub spawn: bool,
    #[serde(default)]
    pub capture: bool,
    pub actor: Option<Slot>,
    /// Total applied turns; drives spectator progress displays.
    #[serde(default)]
    pub turn_count: u64,
    /// Epoch milliseconds of the last applied turn (or seeding). The
    /// supervisor measures stalls against this.
    #[serde(default)]
    pub last_turn_ms: u64,
    // Render fields so spectators need no second lookup.
    pub status: MatchStatus,
    pub stake: Chips,
    pub slots: Vec<Option<UserId>>,
    #[serde(default)]
    pub forfeits: Vec<UserId>,
}

impl LiveState {
    /// Fresh all-zero snapshot for a match, stamped now.
    pub fn seed(m: &Match) -> Self {
        Self {
            positions: vec![0; m.players],
            spawned: vec![false; m.players],
            current_turn: m.live_turn(),
            last_roll: m.last_roll,
            winner: None,
            reverse: false,
            spawn: false,
            capture: false,
            actor: None,
            turn_count: 0,
            last_turn_ms: Self::now_ms(),
            status: m.status,
            stake: m.stake,
            slots: m.seats().to_vec(),
            forfeits: m.forfeits.clone(),
        }
    }
    /// Normalizes a decoded snapshot: pads a short or missing spawned
    /// vector so indexing by slot is always in bounds.
    pub fn normalize(mut self) -> Self {
        while self.spawned.len() < self.positions.len() {
            self.spawned.push(false);
        }
        self
    }
    /// Refreshes the render fields from the durable record after a
    /// mutation, without touching board state.
    pub fn sync(&mut self, m: &Match) {
        self.current_turn = m.live_turn();
        self.last_roll = m.last_roll;
        self.status = m.status;
        self.slots = m.seats().to_vec();
        self.forfeits = m.forfeits.clone();
    }
    /// Milliseconds elapsed since the last applied turn.
    pub fn idle_ms(&self) -> u64 {
        Self::now_ms().saturating_sub(self.last_turn_ms)
    }
    pub fn stamp(&mut self) {
        self.last_turn_ms = Self::now_ms();
    }
    pub fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> LiveState {
        let mut m = Match::open(UserId(1), 10, 2, None);
        m.slots[1] = Some(UserId(2));
        m.status = MatchStatus::Active;
        LiveState::seed(&m)
    }

    #[test]
    fn seed_is_all_zero() {
        let live = seeded();
        assert_eq!(live.positions, vec![0, 0]);
        assert_eq!(live.spawned, vec![false, false]);
        assert_eq!(live.turn_count, 0);
        assert!(live.winner.is_none());
        assert!(live.last_turn_ms > 0);
    }
    #[test]
    fn missing_spawned_defaults_to_unspawned() {
        let json = r#"{"positions":[2,0],"current_turn":0,"last_roll":null,
            "winner":null,"actor":null,"status":"ACTIVE","stake":10,
            "slots":[1,2]}"#;
        let live: LiveState = serde_json::from_str(json).unwrap();
        let live = live.normalize();
        assert_eq!(live.spawned, vec![false, false]);
        assert_eq!(live.turn_count, 0);
    }
    #[test]
    fn idle_counts_from_stamp() {
        let mut live = seeded();
        live.last_turn_ms = LiveState::now_ms().saturating_sub(12_000);
        assert!(live.idle_ms() >= 12_000);
        live.stamp();
        assert!(live.idle_ms() < 1_000);
    }
}
