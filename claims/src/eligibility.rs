//! Eligibility decisions.

use rewards_store::RewardClaim;
use rewards_types::{TokenAmount, UsdAmount};
use serde::{Serialize, Serializer};
use std::fmt;

/// Why a user cannot claim for the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IneligibleReason {
    AlreadyClaimed,
    NoScore,
    RankOutsideThreshold,
}

impl IneligibleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IneligibleReason::AlreadyClaimed => "already claimed",
            IneligibleReason::NoScore => "no score",
            IneligibleReason::RankOutsideThreshold => "rank outside reward threshold",
        }
    }
}

/// Serialized as the human-readable reason, e.g. `"no score"`.
impl Serialize for IneligibleReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claimability of a (user, round) pair.
///
/// When the user already claimed, the amounts are those of the stored claim
/// and the claim itself is attached. Other rejections carry zero amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub can_claim: bool,
    pub reason: Option<IneligibleReason>,
    pub amount_usd: UsdAmount,
    pub amount_tokens: TokenAmount,
    pub already_claimed: Option<RewardClaim>,
}

impl Eligibility {
    pub fn claimable(amount_usd: UsdAmount, amount_tokens: TokenAmount) -> Self {
        Self {
            can_claim: true,
            reason: None,
            amount_usd,
            amount_tokens,
            already_claimed: None,
        }
    }

    pub fn ineligible(reason: IneligibleReason) -> Self {
        Self {
            can_claim: false,
            reason: Some(reason),
            amount_usd: UsdAmount::ZERO,
            amount_tokens: TokenAmount::ZERO,
            already_claimed: None,
        }
    }

    pub fn already_claimed(claim: RewardClaim) -> Self {
        Self {
            can_claim: false,
            reason: Some(IneligibleReason::AlreadyClaimed),
            amount_usd: claim.amount_usd,
            amount_tokens: claim.amount_tokens,
            already_claimed: Some(claim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_render_as_messages() {
        assert_eq!(IneligibleReason::AlreadyClaimed.to_string(), "already claimed");
        assert_eq!(IneligibleReason::NoScore.to_string(), "no score");
        assert_eq!(
            IneligibleReason::RankOutsideThreshold.to_string(),
            "rank outside reward threshold"
        );
    }

    #[test]
    fn ineligible_carries_zero_amounts() {
        let e = Eligibility::ineligible(IneligibleReason::NoScore);
        assert!(!e.can_claim);
        assert!(e.amount_usd.is_zero());
        assert!(e.amount_tokens.is_zero());
        assert!(e.already_claimed.is_none());
    }

    #[test]
    fn serializes_for_callers() {
        let e = Eligibility::ineligible(IneligibleReason::RankOutsideThreshold);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["can_claim"], false);
        assert_eq!(json["reason"], "rank outside reward threshold");

        let json = serde_json::to_value(Eligibility::ineligible(IneligibleReason::NoScore)).unwrap();
        assert_eq!(json["reason"], "no score");
        let json = serde_json::to_value(IneligibleReason::AlreadyClaimed).unwrap();
        assert_eq!(json, "already claimed");
        assert_eq!(json["amount_usd"], "0");
    }
}
