//! Reward claims — the eligibility and claim decision engine.
//!
//! A user may claim one reward per round. The amount is a piecewise function
//! of leaderboard rank and score, defined as data by a [`RewardPolicy`].
//!
//! This crate handles:
//! - Eligibility checks against prior claims, score and rank
//! - Claim issuance, including the duplicate-insert race between two requests
//! - Claim history and exact totals per user

pub mod eligibility;
pub mod engine;
pub mod error;
pub mod policy;
pub mod round;
pub mod totals;

pub use eligibility::{Eligibility, IneligibleReason};
pub use engine::ClaimEngine;
pub use error::{ClaimError, PolicyError};
pub use policy::{RewardBand, RewardPolicy, TokenConversion, BPS_DENOMINATOR};
pub use round::{FixedRound, RoundResolver};
pub use totals::ClaimTotals;
