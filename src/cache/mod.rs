//! Eviction engine: the approximate LFU cache and its thread-safe wrapper.
//!
//! [`LfuCache`] is the single-owner core; [`SharedLfuCache`] wraps it in a
//! coarse lock for shared use. Frequency bookkeeping lives in
//! [`crate::ds::FrequencyLadder`].

pub mod lfu;
pub mod shared;

pub use lfu::LfuCache;
pub use shared::SharedLfuCache;
