/// Result of an operation whose primary transaction committed, with the state of the
/// follow-up effect that runs after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Committed,
    SecondaryEffectPending { reason: String },
    SecondaryEffectFailed { reason: String },
}

impl SettlementOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, SettlementOutcome::Committed)
    }
}
