use super::*;
use spin_core::*;

/// Shared board state for one match: per-slot cell and spawn flag.
///
/// Cell 0 doubles as the start cell and the parking spot for tokens that
/// have not spawned yet; the `spawned` flag disambiguates the two.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    positions: Vec<Cell>,
    spawned: Vec<bool>,
}

/// What one roll did to the board.
///
/// `next` is strict round-robin `(actor + 1) % players`, except on a win
/// where it stays on the actor to tag the winning seat. Forfeit skipping
/// is applied by the caller, never here.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Outcome {
    pub actor: Slot,
    pub roll: Roll,
    pub next: Slot,
    pub winner: Option<Slot>,
    pub reverse: bool,
    pub spawn: bool,
    pub capture: bool,
}

impl Board {
    /// All tokens off-board at cell 0.
    pub fn new(players: usize) -> Self {
        Self {
            positions: vec![0; players],
            spawned: vec![false; players],
        }
    }
    /// Rehydrates a board from a live snapshot. A missing or short spawned
    /// vector is padded with false, matching snapshots written before the
    /// flag existed.
    pub fn from_parts(positions: Vec<Cell>, spawned: Vec<bool>) -> Self {
        let mut spawned = spawned;
        spawned.resize(positions.len(), false);
        Self { positions, spawned }
    }
    pub fn players(&self) -> usize {
        self.positions.len()
    }
    pub fn positions(&self) -> &[Cell] {
        &self.positions
    }
    pub fn spawned(&self) -> &[bool] {
        &self.spawned
    }

    /// Applies one roll for `actor`. Pure up to the in-place mutation:
    /// identical (board, actor, roll) always yields the identical board
    /// and [`Outcome`].
    ///
    /// Priority order:
    /// 1. unspawned actor spawns only on a 1, else stays off-board
    /// 2. landing exactly on the danger cell resets to 0, still spawned
    /// 3. overshooting the winning cell is a no-move
    /// 4. landing exactly on the winning cell wins
    /// 5. otherwise move, resetting every other spawned occupant of the
    ///    landed cell back to 0 (capture)
    pub fn apply(&mut self, actor: Slot, roll: Roll) -> Outcome {
        let players = self.players();
        let advance = (actor + 1) % players;
        let outcome = |next, winner, reverse, spawn, capture| Outcome {
            actor,
            roll,
            next,
            winner,
            reverse,
            spawn,
            capture,
        };
        if !self.spawned[actor] {
            if roll.spawns() {
                self.spawned[actor] = true;
                self.positions[actor] = 0;
                return outcome(advance, None, false, true, false);
            }
            self.positions[actor] = 0;
            return outcome(advance, None, false, false, false);
        }
        let landed = self.positions[actor] + roll.pips();
        if landed == DANGER_CELL {
            self.positions[actor] = 0;
            return outcome(advance, None, true, false, false);
        }
        if landed > BOARD_MAX {
            return outcome(advance, None, false, false, false);
        }
        if landed == BOARD_MAX {
            self.positions[actor] = landed;
            return outcome(actor, Some(actor), false, false, false);
        }
        self.positions[actor] = landed;
        let mut capture = false;
        for other in 0..players {
            if other != actor && self.spawned[other] && self.positions[other] == landed {
                self.positions[other] = 0;
                capture = true;
            }
        }
        outcome(advance, None, false, false, capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(positions: Vec<Cell>, spawned: Vec<bool>) -> Board {
        Board::from_parts(positions, spawned)
    }

    #[test]
    fn deterministic() {
        let seed = board(vec![2, 4], vec![true, true]);
        let mut a = seed.clone();
        let mut b = seed.clone();
        assert_eq!(a.apply(0, Roll::new(2)), b.apply(0, Roll::new(2)));
        assert_eq!(a, b);
    }
    #[test]
    fn unspawned_stays_put_without_one() {
        for pips in 2..=DIE_FACES {
            let mut b = Board::new(2);
            let out = b.apply(0, Roll::new(pips));
            assert_eq!(b.positions(), &[0, 0]);
            assert_eq!(b.spawned(), &[false, false]);
            assert!(!out.spawn);
            assert_eq!(out.next, 1);
        }
    }
    #[test]
    fn spawn_on_one() {
        let mut b = Board::new(2);
        let out = b.apply(0, Roll::new(1));
        assert_eq!(b.positions(), &[0, 0]);
        assert_eq!(b.spawned(), &[true, false]);
        assert!(out.spawn);
        assert_eq!(out.next, 1);
        assert_eq!(out.winner, None);
    }
    #[test]
    fn danger_cell_resets() {
        let mut b = board(vec![1, 0], vec![true, false]);
        let out = b.apply(0, Roll::new(2));
        assert_eq!(b.positions(), &[0, 0]);
        assert!(b.spawned()[0]);
        assert!(out.reverse);
        assert_eq!(out.winner, None);
        assert_eq!(out.next, 1);
    }
    #[test]
    fn overshoot_is_a_no_move() {
        let mut b = board(vec![6, 0], vec![true, true]);
        let out = b.apply(0, Roll::new(4));
        assert_eq!(b.positions(), &[6, 0]);
        assert!(!out.reverse && !out.spawn && !out.capture);
        assert_eq!(out.next, 1);
    }
    #[test]
    fn exact_seven_wins() {
        let mut b = board(vec![5, 0], vec![true, true]);
        let out = b.apply(0, Roll::new(2));
        assert_eq!(out.winner, Some(0));
        assert_eq!(out.next, 0);
        assert!(!out.reverse && !out.spawn && !out.capture);
        assert_eq!(b.positions()[0], BOARD_MAX);
    }
    #[test]
    fn capture_resets_spawned_opponent() {
        let mut b = board(vec![2, 4], vec![true, true]);
        let out = b.apply(0, Roll::new(2));
        assert_eq!(b.positions(), &[4, 0]);
        assert!(b.spawned()[1], "captured token stays spawned");
        assert!(out.capture);
        assert_eq!(out.next, 1);
    }
    #[test]
    fn no_capture_of_unspawned_token() {
        let mut b = board(vec![2, 0], vec![true, false]);
        let out = b.apply(0, Roll::new(2));
        assert_eq!(b.positions(), &[4, 0]);
        assert!(!out.capture);
    }
    #[test]
    fn round_robin_across_three() {
        let mut b = Board::new(3);
        assert_eq!(b.apply(0, Roll::new(2)).next, 1);
        assert_eq!(b.apply(1, Roll::new(2)).next, 2);
        assert_eq!(b.apply(2, Roll::new(2)).next, 0);
    }
    #[test]
    fn worked_example_spawn() {
        // positions=[0,0], spawned=[false,false], turn=0, roll=1
        let mut b = Board::new(2);
        let out = b.apply(0, Roll::new(1));
        assert_eq!(b.positions(), &[0, 0]);
        assert_eq!(b.spawned(), &[true, false]);
        assert_eq!(out.next, 1);
        assert_eq!(out.winner, None);
    }
    #[test]
    fn worked_example_win() {
        // positions=[5,0], spawned=[true,true], turn=0, roll=2
        let mut b = board(vec![5, 0], vec![true, true]);
        assert_eq!(b.apply(0, Roll::new(2)).winner, Some(0));
    }
    #[test]
    fn worked_example_danger() {
        // positions=[1,0], spawned=[true,false], turn=0, roll=2
        let mut b = board(vec![1, 0], vec![true, false]);
        let out = b.apply(0, Roll::new(2));
        assert_eq!(b.positions(), &[0, 0]);
        assert!(out.reverse);
        assert_eq!(out.next, 1);
    }
}
