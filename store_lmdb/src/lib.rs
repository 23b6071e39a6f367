//! LMDB storage backend for the rewards claim engine.
//!
//! Implements [`rewards_store::ClaimStore`] using the `heed` LMDB bindings.
//! Claims, the `(user, round)` uniqueness index, the per-user history index and
//! store metadata each live in their own LMDB database within a single environment.

pub mod claim;
pub mod environment;
pub mod error;
pub mod integrity;

pub use claim::LmdbClaimStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
