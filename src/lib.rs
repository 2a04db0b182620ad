//! pagedvec: a disk-paged random-access array with a frequency-based
//! buffer cache.
//!
//! The crate has two halves that compose:
//!
//! - [`paged::PagedVec`], a `Vec`-like array split into power-of-two pages
//!   that live in a [`store::PageStore`] (in memory or in a checksummed
//!   file) and fault in on access.
//! - [`cache::LfuCache`], the approximate LFU engine that decides which
//!   pages stay resident, built on the fixed-rung
//!   [`ds::FrequencyLadder`]. It is a general-purpose cache and usable on
//!   its own.
//!
//! See the module docs for architecture diagrams and invariants.

pub mod alloc;
pub mod cache;
pub mod ds;
pub mod error;
pub mod paged;
pub mod prelude;
pub mod store;
pub mod traits;

pub use error::{PagedError, Result};
