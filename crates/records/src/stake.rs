use spin_core::*;

/// Immutable (stake, players) → money rule.
///
/// `entry_fee` is debited from each account as it occupies a slot;
/// `winner_payout` is the configured prize, capped by the collected pot
/// at settlement so the house fee can never go negative.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stake {
    pub stake: Chips,
    pub players: usize,
    pub entry_fee: Chips,
    pub winner_payout: Chips,
    pub label: String,
}

impl Stake {
    pub fn new(stake: Chips, players: usize, entry_fee: Chips, winner_payout: Chips, label: &str) -> Self {
        Self {
            stake,
            players,
            entry_fee,
            winner_payout,
            label: label.to_string(),
        }
    }
    /// Free play: no fees, no payout, nothing to settle.
    pub fn is_free(&self) -> bool {
        self.stake == 0
    }
    /// The built-in catalog: free play plus three paid tiers for each
    /// supported table size. Stored as reference data at setup.
    pub fn catalog() -> Vec<Self> {
        let mut rules = Vec::new();
        for players in MIN_PLAYERS..=MAX_PLAYERS {
            let n = players as Chips;
            rules.push(Self::new(0, players, 0, 0, "Free Play"));
            rules.push(Self::new(10, players, 5, 5 * n - 2, "Bronze"));
            rules.push(Self::new(20, players, 10, 10 * n - 4, "Silver"));
            rules.push(Self::new(60, players, 30, 30 * n - 10, "Gold"));
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn catalog_covers_both_table_sizes() {
        let rules = Stake::catalog();
        for players in MIN_PLAYERS..=MAX_PLAYERS {
            assert!(rules.iter().any(|r| r.players == players && r.is_free()));
            assert!(rules.iter().any(|r| r.players == players && !r.is_free()));
        }
    }
    #[test]
    fn paid_tiers_leave_a_house_cut() {
        for rule in Stake::catalog().iter().filter(|r| !r.is_free()) {
            let pot = rule.entry_fee * rule.players as Chips;
            assert!(rule.winner_payout < pot, "{} must rake", rule.label);
        }
    }
    #[test]
    fn bronze_two_player_tier() {
        // stake=10, players=2: entry_fee=5, winner_payout=8 -> pot=10, fee=2
        let rules = Stake::catalog();
        let rule = rules
            .iter()
            .find(|r| r.stake == 10 && r.players == 2)
            .unwrap();
        assert_eq!(rule.entry_fee, 5);
        assert_eq!(rule.winner_payout, 8);
    }
}
