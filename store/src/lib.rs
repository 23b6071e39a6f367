//! Abstract storage traits for the rewards claim engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! these traits. The engine depends only on the traits.

pub mod claim;
pub mod error;

pub use claim::{ClaimMetadata, ClaimStatus, ClaimStore, NewClaim, RewardClaim};
pub use error::StoreError;
