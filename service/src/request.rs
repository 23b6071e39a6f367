//! Caller input validation.
//!
//! Raw requests arrive with every field optional and untyped. They are turned
//! into a [`ClaimRequest`] before the engine is invoked, so the engine only
//! ever sees well-formed identifiers, scores and ranks.

use rewards_types::{ParticipantId, Rank, Score, UserId, ValidationError};

/// An unvalidated claim or eligibility request.
#[derive(Clone, Debug, Default)]
pub struct RawClaimRequest {
    pub user_id: Option<String>,
    pub participant_id: Option<String>,
    pub score: Option<String>,
    pub rank: Option<String>,
}

/// A validated claim or eligibility request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub user_id: UserId,
    pub participant_id: ParticipantId,
    pub score: Score,
    pub rank: Rank,
}

/// User id assumed for callers that do not supply one.
pub fn default_user_id(participant_id: &ParticipantId) -> Result<UserId, ValidationError> {
    UserId::new(format!("user-{participant_id}"))
}

impl TryFrom<RawClaimRequest> for ClaimRequest {
    type Error = ValidationError;

    fn try_from(raw: RawClaimRequest) -> Result<Self, Self::Error> {
        let participant_id = raw
            .participant_id
            .ok_or(ValidationError::Missing("participant_id"))?;
        let score = raw.score.ok_or(ValidationError::Missing("score"))?;
        let rank = raw.rank.ok_or(ValidationError::Missing("rank"))?;

        let participant_id = ParticipantId::new(participant_id)?;
        let user_id = match raw.user_id {
            Some(user_id) => UserId::new(user_id)?,
            None => default_user_id(&participant_id)?,
        };
        Ok(Self {
            user_id,
            participant_id,
            score: score.parse()?,
            rank: rank.parse()?,
        })
    }
}
