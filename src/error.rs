//! Error types for the pagedvec library.
//!
//! A single [`PagedError`] enum covers the whole taxonomy:
//!
//! - *Bounds errors* ([`PagedError::IndexOutOfRange`],
//!   [`PagedError::RangeOutOfBounds`]) are reported synchronously to the
//!   caller and never retried.
//! - *Consistency errors* ([`PagedError::Mutated`]) surface when a cursor
//!   detects a structural mutation mid-enumeration.
//! - *Configuration errors* ([`PagedError::InvalidConfig`],
//!   [`PagedError::CostOverBudget`]) come from fallible constructors and
//!   budget tracking.
//! - *I/O and decode errors* ([`PagedError::Io`], [`PagedError::Corruption`])
//!   propagate unchanged from the page store; no local recovery, no retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagedError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index {index} is out of range, len is {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("range start {start} count {count} is out of range, len is {len}")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("collection was modified during enumeration (version {expected} -> {actual})")]
    Mutated { expected: u64, actual: u64 },

    #[error("corrupt page store: {0}")]
    Corruption(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("item cost {cost} exceeds cache budget {budget}")]
    CostOverBudget { cost: u64, budget: u64 },
}

pub type Result<T> = std::result::Result<T, PagedError>;
