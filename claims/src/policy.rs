//! Reward policy: rank bands and the USD→token conversion, expressed as data.
//!
//! Amounts are computed in integer micro-units:
//! `usd = base_usd + score × score_rate_bps / 10_000`, rounded half-up once.
//! A score rate of 1000 bps means 0.1 USD per score point.

use crate::error::PolicyError;
use rewards_types::{Rank, Score, TokenAmount, UsdAmount};
use serde::{Deserialize, Serialize};

/// Basis points in one whole unit.
pub const BPS_DENOMINATOR: u128 = 10_000;

fn mul_bps_round_half_up(micros: u128, bps: u32) -> u128 {
    micros
        .saturating_mul(u128::from(bps))
        .saturating_add(BPS_DENOMINATOR / 2)
        / BPS_DENOMINATOR
}

/// One row of the reward table: an inclusive rank range and its formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBand {
    pub min_rank: u32,
    pub max_rank: u32,
    /// Flat amount every rank in the band receives.
    pub base_usd: UsdAmount,
    /// USD per score point, in basis points.
    pub score_rate_bps: u32,
}

impl RewardBand {
    pub fn new(min_rank: u32, max_rank: u32, base_usd: UsdAmount, score_rate_bps: u32) -> Self {
        Self {
            min_rank,
            max_rank,
            base_usd,
            score_rate_bps,
        }
    }

    pub fn contains(&self, rank: Rank) -> bool {
        (self.min_rank..=self.max_rank).contains(&rank.get())
    }

    /// USD amount for `score` under this band. Saturates instead of overflowing.
    pub fn amount_for(&self, score: Score) -> UsdAmount {
        let variable = mul_bps_round_half_up(score.micros(), self.score_rate_bps);
        UsdAmount::from_micros(self.base_usd.micros().saturating_add(variable))
    }
}

/// Conversion from a USD reward to the token amount paid out.
///
/// Kept separate from the bands so the ratio can change without touching
/// the rank table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConversion {
    /// Tokens per USD, in basis points. 10_000 is 1:1.
    pub tokens_per_usd_bps: u32,
}

impl TokenConversion {
    pub const ONE_TO_ONE: Self = Self {
        tokens_per_usd_bps: 10_000,
    };

    pub fn new(tokens_per_usd_bps: u32) -> Self {
        Self { tokens_per_usd_bps }
    }

    pub fn convert(&self, usd: UsdAmount) -> TokenAmount {
        TokenAmount::from_micros(mul_bps_round_half_up(usd.micros(), self.tokens_per_usd_bps))
    }
}

impl Default for TokenConversion {
    fn default() -> Self {
        Self::ONE_TO_ONE
    }
}

/// The full reward table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    #[serde(default)]
    pub token_conversion: TokenConversion,
    pub bands: Vec<RewardBand>,
}

impl RewardPolicy {
    /// Build and validate a policy.
    pub fn new(
        bands: Vec<RewardBand>,
        token_conversion: TokenConversion,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            token_conversion,
            bands,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Bands must be non-empty, sorted, and cover ranks `1..=max` without gaps
    /// or overlaps.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.bands.is_empty() {
            return Err(PolicyError::EmptyBands);
        }
        if self.token_conversion.tokens_per_usd_bps == 0 {
            return Err(PolicyError::ZeroConversion);
        }
        let mut expected = 1u32;
        for band in &self.bands {
            if band.min_rank == 0 {
                return Err(PolicyError::ZeroRank);
            }
            if band.min_rank > band.max_rank {
                return Err(PolicyError::InvertedBand {
                    min: band.min_rank,
                    max: band.max_rank,
                });
            }
            if band.min_rank != expected {
                return Err(PolicyError::NotContiguous {
                    expected,
                    found: band.min_rank,
                });
            }
            expected = band.max_rank.saturating_add(1);
        }
        Ok(())
    }

    /// Worst rank that still earns a reward.
    pub fn max_rewarded_rank(&self) -> u32 {
        self.bands.last().map(|b| b.max_rank).unwrap_or(0)
    }

    pub fn band_for(&self, rank: Rank) -> Option<&RewardBand> {
        self.bands.iter().find(|b| b.contains(rank))
    }

    /// USD reward for a score at a rank; zero outside every band.
    pub fn usd_amount(&self, score: Score, rank: Rank) -> UsdAmount {
        self.band_for(rank)
            .map(|band| band.amount_for(score))
            .unwrap_or(UsdAmount::ZERO)
    }

    pub fn token_amount(&self, usd: UsdAmount) -> TokenAmount {
        self.token_conversion.convert(usd)
    }

    /// Replace the token conversion, keeping the bands.
    pub fn with_token_conversion(mut self, token_conversion: TokenConversion) -> Self {
        self.token_conversion = token_conversion;
        self
    }
}

impl Default for RewardPolicy {
    /// | ranks   | USD                  |
    /// |---------|----------------------|
    /// | 1–10    | 100 + score × 0.1    |
    /// | 11–50   | 50 + score × 0.05    |
    /// | 51–100  | 25 + score × 0.025   |
    /// | 101–200 | 10 + score × 0.01    |
    fn default() -> Self {
        Self {
            token_conversion: TokenConversion::ONE_TO_ONE,
            bands: vec![
                RewardBand::new(1, 10, UsdAmount::from_units(100), 1_000),
                RewardBand::new(11, 50, UsdAmount::from_units(50), 500),
                RewardBand::new(51, 100, UsdAmount::from_units(25), 250),
                RewardBand::new(101, 200, UsdAmount::from_units(10), 100),
            ],
        }
    }
}
