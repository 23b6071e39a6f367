//! Input validation errors.
//!
//! Raised while turning caller input into typed values, before any engine
//! operation runs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),

    #[error("{field} exceeds {max} bytes")]
    IdentifierTooLong { field: &'static str, max: usize },

    #[error("{0} contains control characters")]
    ControlCharacter(&'static str),

    #[error("invalid decimal: {0:?}")]
    InvalidDecimal(String),

    #[error("decimal {input:?} has more than {max} fractional digits")]
    TooManyDecimals { input: String, max: u32 },

    #[error("decimal {0:?} is out of range")]
    Overflow(String),

    #[error("score must be non-negative, got {0:?}")]
    NegativeScore(String),

    #[error("rank must be a positive integer, got {0:?}")]
    InvalidRank(String),
}
