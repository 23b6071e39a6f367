//! Reward round resolution.

use rewards_types::RoundId;

/// Resolves which round claims are currently issued for.
pub trait RoundResolver: Send + Sync {
    fn current_round(&self) -> RoundId;
}

/// A round fixed by configuration. Rolling over means changing the config.
#[derive(Clone, Debug)]
pub struct FixedRound(RoundId);

impl FixedRound {
    pub fn new(round: RoundId) -> Self {
        Self(round)
    }
}

impl RoundResolver for FixedRound {
    fn current_round(&self) -> RoundId {
        self.0.clone()
    }
}
