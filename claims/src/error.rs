//! Claim engine errors.

use crate::eligibility::IneligibleReason;
use rewards_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    /// A business rule rejected the claim. Expected and user-facing.
    #[error("not eligible to claim rewards: {reason}")]
    Ineligible { reason: IneligibleReason },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClaimError {
    /// The rejection reason, if this is a business-rule rejection.
    pub fn reason(&self) -> Option<IneligibleReason> {
        match self {
            ClaimError::Ineligible { reason } => Some(*reason),
            ClaimError::Store(_) => None,
        }
    }

    pub fn is_ineligible(&self) -> bool {
        matches!(self, ClaimError::Ineligible { .. })
    }
}

/// An invalid reward band table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("reward policy has no bands")]
    EmptyBands,

    #[error("reward band ranks start at 1, got 0")]
    ZeroRank,

    #[error("reward band {min}..={max} is inverted")]
    InvertedBand { min: u32, max: u32 },

    #[error("reward bands must be contiguous: expected a band starting at rank {expected}, found {found}")]
    NotContiguous { expected: u32, found: u32 },

    #[error("token conversion rate must be non-zero")]
    ZeroConversion,
}
