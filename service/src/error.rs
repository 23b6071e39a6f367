use rewards_claims::{ClaimError, PolicyError};
use rewards_store::StoreError;
use rewards_store_lmdb::LmdbError;
use rewards_types::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("invalid reward policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ServiceError {
    /// Whether the caller is at fault: bad input or a business-rule rejection.
    ///
    /// Everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Validation(_) => true,
            ServiceError::Claim(e) => e.is_ineligible(),
            _ => false,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Claim(ClaimError::Store(e))
    }
}

impl From<LmdbError> for ServiceError {
    fn from(e: LmdbError) -> Self {
        ServiceError::Storage(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServiceError::Runtime(e.to_string())
    }
}
