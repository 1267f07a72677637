use rand::Rng;
use spin_core::*;

/// A single die roll, 1..=6.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Roll(Cell);

impl Roll {
    /// Wraps a raw pip count. Panics outside 1..=6; rolls produced by
    /// [`Arbitrary::random`] are always in range.
    pub fn new(pips: Cell) -> Self {
        assert!((1..=DIE_FACES).contains(&pips), "roll out of range");
        Self(pips)
    }
    pub fn pips(&self) -> Cell {
        self.0
    }
    /// Whether this roll spawns an off-board token.
    pub fn spawns(&self) -> bool {
        self.0 == SPAWN_ROLL
    }
}

impl Arbitrary for Roll {
    fn random() -> Self {
        Self(rand::rng().random_range(1..=DIE_FACES))
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn random_rolls_in_range() {
        for _ in 0..1000 {
            let r = Roll::random();
            assert!((1..=DIE_FACES).contains(&r.pips()));
        }
    }
    #[test]
    fn only_one_spawns() {
        assert!(Roll::new(1).spawns());
        for pips in 2..=DIE_FACES {
            assert!(!Roll::new(pips).spawns());
        }
    }
    #[test]
    #[should_panic]
    fn zero_is_not_a_roll() {
        Roll::new(0);
    }
}
