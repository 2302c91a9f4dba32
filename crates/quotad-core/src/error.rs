//! Shared error type across quotad crates.

use std::time::Duration;

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, QuotadError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum QuotadError {
    #[error("count must be greater than 0")]
    InvalidCount,
    #[error("period must be greater than 0")]
    InvalidPeriod,
    #[error("maximum period is 45 days (got {0:?})")]
    PeriodTooLong(Duration),
    #[error("block_size must be greater than 0")]
    InvalidBlockSize,
    #[error("block_size fraction must be in (0, 1] (got {0})")]
    InvalidBlockFraction(f64),
    #[error("cleanup interval must be greater than 0")]
    InvalidInterval,
    #[error("invalid ratelimit definition: {0:?}")]
    InvalidDefinition(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
