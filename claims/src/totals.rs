//! Per-user claim totals.

use rewards_store::RewardClaim;
use rewards_types::{TokenAmount, UsdAmount};
use serde::Serialize;

/// Exact sums over a user's claim history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClaimTotals {
    pub total_usd: UsdAmount,
    pub total_tokens: TokenAmount,
    pub claim_count: u64,
}

impl ClaimTotals {
    /// Sum a history the caller already holds.
    ///
    /// Fixed-point addition is exact, so no intermediate rounding occurs.
    /// Saturates rather than wrapping on absurd totals.
    pub fn from_claims(claims: &[RewardClaim]) -> Self {
        claims.iter().fold(Self::default(), |acc, claim| Self {
            total_usd: acc.total_usd.saturating_add(claim.amount_usd),
            total_tokens: acc.total_tokens.saturating_add(claim.amount_tokens),
            claim_count: acc.claim_count + 1,
        })
    }
}
