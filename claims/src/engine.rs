//! Core claim decision engine.

use crate::eligibility::{Eligibility, IneligibleReason};
use crate::error::ClaimError;
use crate::policy::RewardPolicy;
use crate::round::RoundResolver;
use crate::totals::ClaimTotals;
use rewards_store::{ClaimMetadata, ClaimStore, NewClaim, RewardClaim};
use rewards_types::{Clock, ParticipantId, Rank, RoundId, Score, TokenAmount, UsdAmount, UserId};

/// Outcome of evaluating one (user, round) against the store and policy.
enum Decision {
    Claimable {
        amount_usd: UsdAmount,
        amount_tokens: TokenAmount,
        rank: Rank,
    },
    Rejected(Eligibility),
}

/// The claim engine — decides eligibility, issues claims, reports history.
///
/// Holds no mutable state of its own: every decision is made from a fresh
/// store read, so an ineligible user becomes eligible as soon as their
/// score or rank changes. The only cross-request invariant, one claim per
/// (user, round), is left to the store's uniqueness constraint.
pub struct ClaimEngine<S, C, R> {
    store: S,
    clock: C,
    rounds: R,
    policy: RewardPolicy,
}

impl<S, C, R> ClaimEngine<S, C, R>
where
    S: ClaimStore,
    C: Clock,
    R: RoundResolver,
{
    pub fn new(store: S, clock: C, rounds: R, policy: RewardPolicy) -> Self {
        Self {
            store,
            clock,
            rounds,
            policy,
        }
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_round(&self) -> RoundId {
        self.rounds.current_round()
    }

    fn decide(
        &self,
        user_id: &UserId,
        round_id: &RoundId,
        score: Score,
        rank: Option<Rank>,
    ) -> Result<Decision, ClaimError> {
        if let Some(existing) = self.store.find_claim(user_id, round_id)? {
            return Ok(Decision::Rejected(Eligibility::already_claimed(existing)));
        }
        if !score.is_positive() {
            return Ok(Decision::Rejected(Eligibility::ineligible(
                IneligibleReason::NoScore,
            )));
        }
        let rank = match rank {
            Some(rank) if rank.get() <= self.policy.max_rewarded_rank() => rank,
            _ => {
                return Ok(Decision::Rejected(Eligibility::ineligible(
                    IneligibleReason::RankOutsideThreshold,
                )))
            }
        };
        let amount_usd = self.policy.usd_amount(score, rank);
        Ok(Decision::Claimable {
            amount_usd,
            amount_tokens: self.policy.token_amount(amount_usd),
            rank,
        })
    }

    /// Check whether `user_id` may claim for the current round, and how much.
    ///
    /// Pure read: repeated calls with the same inputs and no intervening claim
    /// return the same result.
    pub fn check_eligibility(
        &self,
        user_id: &UserId,
        participant_id: &ParticipantId,
        score: Score,
        rank: Option<Rank>,
    ) -> Result<Eligibility, ClaimError> {
        let round_id = self.rounds.current_round();
        let eligibility = match self.decide(user_id, &round_id, score, rank)? {
            Decision::Claimable {
                amount_usd,
                amount_tokens,
                ..
            } => Eligibility::claimable(amount_usd, amount_tokens),
            Decision::Rejected(eligibility) => eligibility,
        };
        tracing::debug!(
            user = %user_id,
            participant = %participant_id,
            round = %round_id,
            can_claim = eligibility.can_claim,
            reason = eligibility.reason.map(|r| r.as_str()),
            amount_usd = %eligibility.amount_usd,
            "checked claim eligibility"
        );
        Ok(eligibility)
    }

    /// Claim the current round's reward.
    ///
    /// Eligibility is always re-evaluated here from the caller's inputs and a
    /// fresh store read; an earlier check result is never trusted. When a
    /// concurrent request wins the insert, the store's duplicate-key signal is
    /// reported as [`IneligibleReason::AlreadyClaimed`].
    pub fn claim_rewards(
        &self,
        user_id: &UserId,
        participant_id: &ParticipantId,
        score: Score,
        rank: Option<Rank>,
    ) -> Result<RewardClaim, ClaimError> {
        let round_id = self.rounds.current_round();
        let (amount_usd, amount_tokens, rank) =
            match self.decide(user_id, &round_id, score, rank)? {
                Decision::Claimable {
                    amount_usd,
                    amount_tokens,
                    rank,
                } => (amount_usd, amount_tokens, rank),
                Decision::Rejected(eligibility) => {
                    let reason = eligibility
                        .reason
                        .unwrap_or(IneligibleReason::AlreadyClaimed);
                    tracing::debug!(user = %user_id, round = %round_id, %reason, "claim rejected");
                    return Err(ClaimError::Ineligible { reason });
                }
            };

        let claimed_at = self.clock.now();
        let new_claim = NewClaim {
            user_id: user_id.clone(),
            participant_id: participant_id.clone(),
            round_id: round_id.clone(),
            amount_usd,
            amount_tokens,
            claimed_at,
            metadata: ClaimMetadata {
                score,
                rank,
                claimed_at,
            },
        };

        match self.store.insert_claim(new_claim) {
            Ok(claim) => {
                tracing::info!(
                    claim_id = %claim.id,
                    user = %claim.user_id,
                    participant = %claim.participant_id,
                    round = %claim.round_id,
                    amount_usd = %claim.amount_usd,
                    amount_tokens = %claim.amount_tokens,
                    "reward claimed"
                );
                Ok(claim)
            }
            Err(e) if e.is_duplicate() => {
                tracing::warn!(
                    user = %user_id,
                    round = %round_id,
                    "concurrent claim already stored for this round"
                );
                Err(ClaimError::Ineligible {
                    reason: IneligibleReason::AlreadyClaimed,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All claims of a user, newest first.
    pub fn claim_history(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, ClaimError> {
        Ok(self.store.list_claims(user_id)?)
    }

    /// Exact totals over a user's claim history.
    pub fn total_claimed(&self, user_id: &UserId) -> Result<ClaimTotals, ClaimError> {
        let history = self.claim_history(user_id)?;
        Ok(ClaimTotals::from_claims(&history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TokenConversion;
    use crate::round::FixedRound;
    use rewards_nullables::{NullClaimStore, NullClock, StoreFailure};
    use rewards_store::{ClaimStatus, StoreError};
    use rewards_types::Timestamp;
    use std::sync::Arc;

    type TestEngine = ClaimEngine<Arc<NullClaimStore>, Arc<NullClock>, FixedRound>;

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn participant() -> ParticipantId {
        ParticipantId::new("talent-42").unwrap()
    }

    fn rank(n: u32) -> Option<Rank> {
        Some(Rank::new(n).unwrap())
    }

    fn usd(s: &str) -> UsdAmount {
        s.parse().unwrap()
    }

    fn make_engine() -> (TestEngine, Arc<NullClaimStore>, Arc<NullClock>) {
        let store = Arc::new(NullClaimStore::new());
        let clock = Arc::new(NullClock::new(1_700_000_000));
        let engine = ClaimEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            FixedRound::new(RoundId::new("round-1").unwrap()),
            RewardPolicy::default(),
        );
        (engine, store, clock)
    }

    #[test]
    fn top_ten_rank_is_claimable() {
        let (engine, _, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(500), rank(5))
            .unwrap();
        assert!(e.can_claim);
        assert_eq!(e.reason, None);
        assert_eq!(e.amount_usd, usd("150"));
        assert_eq!(e.amount_tokens, "150".parse().unwrap());
    }

    #[test]
    fn zero_score_is_rejected() {
        let (engine, _, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::ZERO, rank(3))
            .unwrap();
        assert!(!e.can_claim);
        assert_eq!(e.reason, Some(IneligibleReason::NoScore));
        assert!(e.amount_usd.is_zero());
    }

    #[test]
    fn rank_past_threshold_is_rejected() {
        let (engine, _, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(500), rank(201))
            .unwrap();
        assert_eq!(e.reason, Some(IneligibleReason::RankOutsideThreshold));
        assert!(e.amount_usd.is_zero());
        assert!(e.amount_tokens.is_zero());
    }

    #[test]
    fn missing_rank_is_rejected() {
        let (engine, _, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(500), None)
            .unwrap();
        assert_eq!(e.reason, Some(IneligibleReason::RankOutsideThreshold));
    }

    #[test]
    fn score_is_checked_before_rank() {
        let (engine, _, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::ZERO, rank(500))
            .unwrap();
        assert_eq!(e.reason, Some(IneligibleReason::NoScore));
    }

    #[test]
    fn claim_then_check_reports_stored_claim() {
        let (engine, _, _) = make_engine();
        let claim = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap();
        assert_eq!(claim.amount_usd, usd("30"));
        assert_eq!(claim.status, ClaimStatus::Claimed);
        assert_eq!(claim.round_id.as_str(), "round-1");
        assert_eq!(claim.participant_id, participant());
        assert_eq!(claim.claimed_at, Timestamp::new(1_700_000_000));
        assert_eq!(claim.metadata.score, Score::from_points(200));
        assert_eq!(claim.metadata.rank.get(), 80);
        assert!(claim.transaction_hash.is_none());

        // A different score now must not change the outcome.
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(9_999), rank(1))
            .unwrap();
        assert!(!e.can_claim);
        assert_eq!(e.reason, Some(IneligibleReason::AlreadyClaimed));
        assert_eq!(e.amount_usd, usd("30"));
        assert_eq!(e.already_claimed, Some(claim));
    }

    #[test]
    fn second_claim_is_ineligible() {
        let (engine, store, _) = make_engine();
        engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap();
        let err = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap_err();
        assert_eq!(err.reason(), Some(IneligibleReason::AlreadyClaimed));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn claim_rechecks_instead_of_trusting_earlier_check() {
        let (engine, store, _) = make_engine();
        let e = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(500), rank(150))
            .unwrap();
        assert!(e.can_claim);

        // The user dropped out of the rewarded ranks before claiming.
        let err = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(500), rank(250))
            .unwrap_err();
        assert_eq!(err.reason(), Some(IneligibleReason::RankOutsideThreshold));
        assert!(store.is_empty());
    }

    #[test]
    fn ineligible_claim_writes_nothing() {
        let (engine, store, _) = make_engine();
        let err = engine
            .claim_rewards(&user("alice"), &participant(), Score::ZERO, rank(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ClaimError::Ineligible {
                reason: IneligibleReason::NoScore
            }
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_insert_race_becomes_already_claimed() {
        let (engine, store, _) = make_engine();
        engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap();

        // The second request read before the first insert was visible.
        store.set_stale_reads(true);
        let err = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap_err();
        assert_eq!(err.reason(), Some(IneligibleReason::AlreadyClaimed));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn other_store_failures_propagate() {
        let (engine, store, _) = make_engine();
        store.fail(StoreFailure::Insert);
        let err = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap_err();
        assert!(matches!(err, ClaimError::Store(StoreError::Backend(_))));

        store.heal();
        store.fail(StoreFailure::Find);
        let err = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(200), rank(80))
            .unwrap_err();
        assert!(!err.is_ineligible());
    }

    #[test]
    fn concurrent_claims_store_one_row() {
        let (engine, store, _) = make_engine();
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.claim_rewards(
                        &user("alice"),
                        &participant(),
                        Score::from_points(200),
                        rank(80),
                    )
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(err.reason(), Some(IneligibleReason::AlreadyClaimed));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn check_is_idempotent() {
        let (engine, _, clock) = make_engine();
        let first = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(42), rank(30))
            .unwrap();
        clock.advance(3_600);
        let second = engine
            .check_eligibility(&user("alice"), &participant(), Score::from_points(42), rank(30))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn round_rollover_allows_a_new_claim() {
        let store = Arc::new(NullClaimStore::new());
        let clock = Arc::new(NullClock::new(10));
        let round_one = ClaimEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            FixedRound::new(RoundId::new("round-1").unwrap()),
            RewardPolicy::default(),
        );
        round_one
            .claim_rewards(&user("alice"), &participant(), Score::from_points(10), rank(1))
            .unwrap();

        clock.advance(100);
        let round_two = ClaimEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            FixedRound::new(RoundId::new("round-2").unwrap()),
            RewardPolicy::default(),
        );
        assert!(round_two
            .check_eligibility(&user("alice"), &participant(), Score::from_points(10), rank(1))
            .unwrap()
            .can_claim);
        round_two
            .claim_rewards(&user("alice"), &participant(), Score::from_points(10), rank(1))
            .unwrap();

        let history = round_two.claim_history(&user("alice")).unwrap();
        let rounds: Vec<_> = history.iter().map(|c| c.round_id.as_str()).collect();
        assert_eq!(rounds, vec!["round-2", "round-1"]);
    }

    #[test]
    fn totals_sum_history_exactly() {
        let store = Arc::new(NullClaimStore::new());
        let clock = Arc::new(NullClock::new(10));
        let engine_for = |round: &str| {
            ClaimEngine::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                FixedRound::new(RoundId::new(round).unwrap()),
                RewardPolicy::default(),
            )
        };
        // Rank 150 pays 10 + 0.01 × score.
        for (round, points) in [("round-1", 1), ("round-2", 2), ("round-3", 3)] {
            engine_for(round)
                .claim_rewards(&user("alice"), &participant(), Score::from_points(points), rank(150))
                .unwrap();
            clock.advance(1);
        }

        let engine = engine_for("round-4");
        let history = engine.claim_history(&user("alice")).unwrap();
        let totals = engine.total_claimed(&user("alice")).unwrap();
        assert_eq!(totals.claim_count, 3);
        assert_eq!(totals.total_usd, usd("30.06"));
        assert_eq!(totals.total_tokens, "30.06".parse().unwrap());
        assert_eq!(totals, ClaimTotals::from_claims(&history));
    }

    #[test]
    fn empty_history_totals_are_zero() {
        let (engine, _, _) = make_engine();
        assert!(engine.claim_history(&user("nobody")).unwrap().is_empty());
        assert_eq!(
            engine.total_claimed(&user("nobody")).unwrap(),
            ClaimTotals::default()
        );
    }

    #[test]
    fn custom_token_conversion_only_changes_tokens() {
        let store = Arc::new(NullClaimStore::new());
        let engine = ClaimEngine::new(
            Arc::clone(&store),
            Arc::new(NullClock::new(0)),
            FixedRound::new(RoundId::new("round-1").unwrap()),
            RewardPolicy::default().with_token_conversion(TokenConversion::new(20_000)),
        );
        let claim = engine
            .claim_rewards(&user("alice"), &participant(), Score::from_points(500), rank(5))
            .unwrap();
        assert_eq!(claim.amount_usd, usd("150"));
        assert_eq!(claim.amount_tokens, "300".parse().unwrap());
    }
}
