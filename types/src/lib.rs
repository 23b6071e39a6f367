//! Fundamental types for the rewards claim engine.
//!
//! This crate defines the value types shared across every other crate in the workspace:
//! identifiers, fixed-point amounts, scores and ranks, timestamps, and input validation errors.

pub mod amount;
pub mod error;
pub mod id;
pub mod score;
pub mod time;

pub use amount::{TokenAmount, UsdAmount, MICROS_PER_UNIT};
pub use error::ValidationError;
pub use id::{ClaimId, ParticipantId, RoundId, UserId, MAX_ID_LEN};
pub use score::{Rank, Score};
pub use time::{Clock, SystemClock, Timestamp};
