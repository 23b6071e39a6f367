//! Rewards service — wires configuration, LMDB storage and the claim engine
//! behind an async facade.
//!
//! The engine itself is synchronous; every call is moved onto tokio's
//! blocking pool so callers on an async runtime never stall on disk I/O.

pub mod config;
pub mod error;
pub mod request;
pub mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use request::{ClaimRequest, RawClaimRequest};
pub use service::{ClaimSummary, RewardsService};
