//! The async rewards service.

use std::sync::Arc;

use serde::Serialize;

use rewards_claims::{ClaimEngine, ClaimError, ClaimTotals, Eligibility, FixedRound, RoundResolver};
use rewards_store::{ClaimStore, RewardClaim};
use rewards_store_lmdb::{check_integrity, LmdbClaimStore, LmdbEnvironment};
use rewards_types::{Clock, RoundId, SystemClock, UserId};

use crate::{ClaimRequest, ServiceConfig, ServiceError};

/// A user's claim history together with its totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClaimSummary {
    pub history: Vec<RewardClaim>,
    pub totals: ClaimTotals,
}

/// Async facade over a [`ClaimEngine`].
pub struct RewardsService<S = LmdbClaimStore, C = SystemClock, R = FixedRound> {
    engine: Arc<ClaimEngine<S, C, R>>,
}

impl RewardsService {
    /// Open the LMDB store under `config.data_dir` and build the engine.
    pub fn open(config: &ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;

        if config.check_integrity {
            let report = check_integrity(&env)?;
            if !report.is_healthy() {
                return Err(ServiceError::Storage(format!(
                    "integrity check failed: {}",
                    report.errors.join("; ")
                )));
            }
        }

        let round = config.round()?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            round = %round,
            max_rewarded_rank = config.policy.max_rewarded_rank(),
            "rewards service ready"
        );
        let engine = ClaimEngine::new(
            env.claim_store(),
            SystemClock,
            FixedRound::new(round),
            config.policy.clone(),
        );
        Ok(Self::from_engine(engine))
    }
}

impl<S, C, R> RewardsService<S, C, R>
where
    S: ClaimStore + Send + Sync + 'static,
    C: Clock + 'static,
    R: RoundResolver + 'static,
{
    pub fn from_engine(engine: ClaimEngine<S, C, R>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &ClaimEngine<S, C, R> {
        &self.engine
    }

    pub fn current_round(&self) -> RoundId {
        self.engine.current_round()
    }

    async fn run<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&ClaimEngine<S, C, R>) -> Result<T, ClaimError> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || op(engine.as_ref())).await?;
        Ok(result?)
    }

    /// Eligibility of the requesting user for the current round.
    pub async fn check(&self, request: &ClaimRequest) -> Result<Eligibility, ServiceError> {
        let req = request.clone();
        self.run(move |engine| {
            engine.check_eligibility(&req.user_id, &req.participant_id, req.score, Some(req.rank))
        })
        .await
    }

    /// Check, then claim.
    ///
    /// An ineligible user is turned away with the reason before any write is
    /// attempted. The claim itself re-evaluates eligibility, so a change
    /// between the two steps cannot slip through.
    pub async fn claim(&self, request: &ClaimRequest) -> Result<RewardClaim, ServiceError> {
        let eligibility = self.check(request).await?;
        if let (false, Some(reason)) = (eligibility.can_claim, eligibility.reason) {
            return Err(ClaimError::Ineligible { reason }.into());
        }

        let req = request.clone();
        self.run(move |engine| {
            engine.claim_rewards(&req.user_id, &req.participant_id, req.score, Some(req.rank))
        })
        .await
    }

    pub async fn history(&self, user_id: &UserId) -> Result<Vec<RewardClaim>, ServiceError> {
        let user_id = user_id.clone();
        self.run(move |engine| engine.claim_history(&user_id)).await
    }

    pub async fn totals(&self, user_id: &UserId) -> Result<ClaimTotals, ServiceError> {
        let user_id = user_id.clone();
        self.run(move |engine| engine.total_claimed(&user_id)).await
    }

    /// History and totals, read concurrently.
    pub async fn summary(&self, user_id: &UserId) -> Result<ClaimSummary, ServiceError> {
        let (history, totals) = tokio::try_join!(self.history(user_id), self.totals(user_id))?;
        Ok(ClaimSummary { history, totals })
    }
}
