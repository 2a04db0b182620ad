//! Cross-cutting trait surface: buffer allocation and time sources.
//!
//! Both traits exist so the heavy machinery stays injectable:
//!
//! - [`ArrayAllocator`] decouples page-buffer ownership from the paged array,
//!   so repeated page-in/page-out cycles can reuse buffers instead of
//!   hammering the global allocator. Allocators are explicit instances
//!   threaded through constructors, never process-wide mutable defaults.
//! - [`Clock`] abstracts the monotonic tick source used for obsolescence
//!   tracking in the eviction engine, so tests (and embedders) can drive
//!   time manually.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Rents and recycles reusable element buffers.
///
/// The contract mirrors a pool: [`rent`](Self::rent) hands out a buffer with
/// `len() >= min_len` whose first `min_len` slots hold `T::default()`, so
/// callers may skip re-initialization (the "clean rent" guarantee), and
/// [`recycle`](Self::recycle) takes the buffer back, optionally clearing it
/// first. Every rented buffer must be recycled exactly once.
///
/// Implementations live in [`crate::alloc`].
pub trait ArrayAllocator<T> {
    /// Returns a buffer of length at least `min_len`, default-filled.
    fn rent(&mut self, min_len: usize) -> Vec<T>;

    /// Takes a buffer back. When `clear` is set the used region is reset to
    /// `T::default()` before the buffer becomes rentable again.
    fn recycle(&mut self, buf: Vec<T>, clear: bool);
}

/// Monotonic tick source for obsolescence tracking.
///
/// Ticks are opaque; only differences matter. The eviction engine compares
/// `now - last_access` against a staleness window expressed in the same
/// units.
pub trait Clock {
    fn ticks(&self) -> u64;
}

/// Wall-clock [`Clock`] backed by [`Instant`]; one tick is one microsecond.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn ticks(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Manually advanced [`Clock`] for tests and deterministic replays.
///
/// Clones share the same underlying counter, so a copy can keep advancing
/// time after the original has been handed to the cache.
///
/// # Example
///
/// ```
/// use pagedvec::traits::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// assert_eq!(clock.ticks(), 0);
///
/// handle.advance(25);
/// assert_eq!(clock.ticks(), 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: u64) {
        self.ticks.fetch_add(delta, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_state_between_clones() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(10);
        b.advance(5);
        assert_eq!(a.ticks(), 15);
        assert_eq!(b.ticks(), 15);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.ticks();
        let second = clock.ticks();
        assert!(second >= first);
    }
}
