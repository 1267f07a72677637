use spin_core::*;

/// Who is acting on a match.
///
/// Humans arrive through the HTTP surface; agents are driven by the
/// backfill service. Both flow through the identical roll/forfeit paths,
/// which depend only on the id, so an agent turn is validated exactly
/// like a human one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Caller {
    Human(UserId),
    Agent(UserId),
}

impl Caller {
    pub fn id(&self) -> UserId {
        match self {
            Self::Human(id) | Self::Agent(id) => *id,
        }
    }
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent(_))
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human(id) => write!(f, "human {}", id),
            Self::Agent(id) => write!(f, "agent {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn both_variants_expose_id() {
        assert_eq!(Caller::Human(UserId(9)).id(), UserId(9));
        assert_eq!(Caller::Agent(UserId(-2)).id(), UserId(-2));
        assert!(Caller::Agent(UserId(-2)).is_agent());
        assert!(!Caller::Human(UserId(9)).is_agent());
    }
}
