//! Allocation error types.
//!
//! The taxonomy is narrow: the core makes filtering decisions rather
//! than raising faults. Capacity shortfall is not an error — it shows
//! up as fewer candidates than requested, and the caller decides what
//! to do about it.

use thiserror::Error;

/// Caller bugs surfaced by the allocation core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("operation requires a count spec, got a fixed-flavor request")]
    NotCountSpec,

    #[error("invalid allocation request: {0}")]
    InvalidRequest(String),
}

pub type AllocationResult<T> = Result<T, AllocationError>;
