//! Shared utilities for the rewards claim engine.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
