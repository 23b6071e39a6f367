//! Reward claim records and the claim storage trait.

use std::sync::Arc;

use crate::StoreError;
use rewards_types::{
    ClaimId, ParticipantId, Rank, RoundId, Score, Timestamp, TokenAmount, UsdAmount, UserId,
};
use serde::{Deserialize, Serialize};

/// Lifecycle tag of a stored claim.
///
/// The claim engine only ever writes `Claimed`. The other states belong to
/// settlement processes that run after issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Claimed,
    Settled,
    Failed,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Claimed => "claimed",
            ClaimStatus::Settled => "settled",
            ClaimStatus::Failed => "failed",
        }
    }
}

/// Audit snapshot of the inputs an amount was computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    pub score: Score,
    pub rank: Rank,
    pub claimed_at: Timestamp,
}

/// A successfully issued reward: one per (user, round).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaim {
    pub id: ClaimId,
    pub user_id: UserId,
    pub participant_id: ParticipantId,
    pub round_id: RoundId,
    pub amount_usd: UsdAmount,
    pub amount_tokens: TokenAmount,
    pub claimed_at: Timestamp,
    pub created_at: Timestamp,
    /// Set by settlement once a transfer lands; always `None` at creation.
    pub transaction_hash: Option<String>,
    pub status: ClaimStatus,
    pub metadata: ClaimMetadata,
}

/// A claim that has passed eligibility and is ready to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClaim {
    pub user_id: UserId,
    pub participant_id: ParticipantId,
    pub round_id: RoundId,
    pub amount_usd: UsdAmount,
    pub amount_tokens: TokenAmount,
    pub claimed_at: Timestamp,
    pub metadata: ClaimMetadata,
}

impl NewClaim {
    /// Materialize the stored row once the backend has assigned an id.
    ///
    /// `created_at` is stamped from the claim time of the insertion request.
    pub fn into_claim(self, id: ClaimId) -> RewardClaim {
        RewardClaim {
            id,
            user_id: self.user_id,
            participant_id: self.participant_id,
            round_id: self.round_id,
            amount_usd: self.amount_usd,
            amount_tokens: self.amount_tokens,
            claimed_at: self.claimed_at,
            created_at: self.claimed_at,
            transaction_hash: None,
            status: ClaimStatus::Claimed,
            metadata: self.metadata,
        }
    }
}

/// Trait for reward claim storage.
///
/// Implementations must enforce uniqueness of `(user_id, round_id)` inside
/// `insert_claim` itself, failing with [`StoreError::Duplicate`] when a row
/// already exists. Callers rely on that signal to resolve concurrent claims.
pub trait ClaimStore {
    /// Find the claim a user made for a round, if any.
    fn find_claim(
        &self,
        user_id: &UserId,
        round_id: &RoundId,
    ) -> Result<Option<RewardClaim>, StoreError>;

    /// Insert a claim, assigning its id.
    fn insert_claim(&self, claim: NewClaim) -> Result<RewardClaim, StoreError>;

    /// All claims of a user, newest first by `created_at`, ties by descending id.
    fn list_claims(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, StoreError>;
}

impl<S: ClaimStore + ?Sized> ClaimStore for Arc<S> {
    fn find_claim(
        &self,
        user_id: &UserId,
        round_id: &RoundId,
    ) -> Result<Option<RewardClaim>, StoreError> {
        (**self).find_claim(user_id, round_id)
    }

    fn insert_claim(&self, claim: NewClaim) -> Result<RewardClaim, StoreError> {
        (**self).insert_claim(claim)
    }

    fn list_claims(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, StoreError> {
        (**self).list_claims(user_id)
    }
}
