//! [`ArrayAllocator`] implementations.
//!
//! - [`HeapAllocator`]: allocates fresh and drops on recycle. The baseline.
//! - [`PoolAllocator`]: keeps a bounded shelf of cleared buffers and hands
//!   them back out, which matters when a paged array churns through
//!   page-in/page-out cycles with page-sized buffers.
//!
//! Both uphold the clean-rent guarantee: rented buffers are default-filled
//! up to the requested length.

use crate::traits::ArrayAllocator;

/// Allocates a fresh default-filled buffer per rent; recycling drops.
#[derive(Debug, Default)]
pub struct HeapAllocator;

impl HeapAllocator {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Default + Clone> ArrayAllocator<T> for HeapAllocator {
    fn rent(&mut self, min_len: usize) -> Vec<T> {
        vec![T::default(); min_len]
    }

    fn recycle(&mut self, buf: Vec<T>, _clear: bool) {
        drop(buf);
    }
}

/// Buffer pool with a bounded shelf.
///
/// Recycled buffers are cleared and kept for reuse, up to `max_pooled`
/// buffers; beyond that they are dropped. Rent prefers a pooled buffer of
/// sufficient capacity and resizes it to exactly `min_len`.
///
/// # Example
///
/// ```
/// use pagedvec::alloc::PoolAllocator;
/// use pagedvec::traits::ArrayAllocator;
///
/// let mut pool: PoolAllocator<u32> = PoolAllocator::new(4);
/// let buf = pool.rent(8);
/// assert_eq!(buf, vec![0u32; 8]);
///
/// pool.recycle(buf, true);
/// assert_eq!(pool.pooled(), 1);
///
/// // Reuses the shelved buffer instead of allocating.
/// let again = pool.rent(8);
/// assert_eq!(again.len(), 8);
/// assert_eq!(pool.pooled(), 0);
/// ```
#[derive(Debug)]
pub struct PoolAllocator<T> {
    shelf: Vec<Vec<T>>,
    max_pooled: usize,
}

impl<T> PoolAllocator<T> {
    pub fn new(max_pooled: usize) -> Self {
        Self {
            shelf: Vec::new(),
            max_pooled,
        }
    }

    /// Number of buffers currently shelved.
    pub fn pooled(&self) -> usize {
        self.shelf.len()
    }
}

impl<T: Default + Clone> ArrayAllocator<T> for PoolAllocator<T> {
    fn rent(&mut self, min_len: usize) -> Vec<T> {
        let pos = self.shelf.iter().position(|b| b.capacity() >= min_len);
        match pos {
            Some(i) => {
                let mut buf = self.shelf.swap_remove(i);
                buf.resize(min_len, T::default());
                buf
            }
            None => vec![T::default(); min_len],
        }
    }

    fn recycle(&mut self, mut buf: Vec<T>, clear: bool) {
        if self.shelf.len() >= self.max_pooled {
            return;
        }
        if clear {
            for slot in buf.iter_mut() {
                *slot = T::default();
            }
        }
        self.shelf.push(buf);
    }
}
