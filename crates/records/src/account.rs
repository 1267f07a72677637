use spin_core::*;

/// Identity + balance view consumed from the external account provider.
///
/// Registration, login, and profile data are someone else's problem; the
/// match engine only ever needs the id and the spendable balance.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: Option<String>,
    pub balance: Chips,
}

impl Account {
    pub fn can_afford(&self, fee: Chips) -> bool {
        fee <= 0 || self.balance >= fee
    }
    /// Chips needed to bring an agent account up to the seating floor.
    pub fn shortfall(&self) -> Chips {
        (AGENT_MIN_BALANCE - self.balance).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn account(balance: Chips) -> Account {
        Account {
            id: UserId(-1),
            name: None,
            balance,
        }
    }
    #[test]
    fn affordability() {
        assert!(account(10).can_afford(10));
        assert!(account(10).can_afford(0));
        assert!(!account(9).can_afford(10));
    }
    #[test]
    fn floor_shortfall() {
        assert_eq!(account(AGENT_MIN_BALANCE).shortfall(), 0);
        assert_eq!(account(AGENT_MIN_BALANCE + 5).shortfall(), 0);
        assert_eq!(account(10).shortfall(), AGENT_MIN_BALANCE - 10);
    }
}
