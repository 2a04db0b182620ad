//! Versioned enumeration over a paged array.
//!
//! A [`Cursor`] captures the array's structural version when created and
//! checks it on every step, so enumeration fails fast with
//! [`PagedError::Mutated`] instead of silently skipping or repeating
//! elements after an insert or remove. The cursor borrows the array only
//! per step, which is what lets the mutation happen between steps in the
//! first place.

use crate::error::{PagedError, Result};
use crate::paged::PagedVec;
use crate::store::PageStore;

/// Detached enumeration position. Obtain one via
/// [`PagedVec::cursor`](crate::paged::PagedVec::cursor).
///
/// # Example
///
/// ```
/// use pagedvec::paged::PagedVecBuilder;
/// use pagedvec::store::MemoryPageStore;
///
/// let store: MemoryPageStore<u32> = MemoryPageStore::new(4);
/// let mut vec = PagedVecBuilder::new().create(store).unwrap();
/// vec.push_all([10, 20, 30]).unwrap();
///
/// let mut cursor = vec.cursor();
/// let mut seen = Vec::new();
/// while let Some(item) = cursor.next(&mut vec) {
///     seen.push(item.unwrap());
/// }
/// assert_eq!(seen, vec![10, 20, 30]);
/// ```
#[derive(Debug, Clone)]
pub struct Cursor {
    pos: usize,
    version: u64,
}

impl Cursor {
    pub(crate) fn new(version: u64) -> Self {
        Self { pos: 0, version }
    }

    /// Position of the next element to yield.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Yields the next element, or `None` at the end. Returns
    /// [`PagedError::Mutated`] if the array was structurally mutated since
    /// the cursor was created.
    pub fn next<T, S>(&mut self, vec: &mut PagedVec<T, S>) -> Option<Result<T>>
    where
        T: Clone + Default,
        S: PageStore<T>,
    {
        if vec.version() != self.version {
            return Some(Err(PagedError::Mutated {
                expected: self.version,
                actual: vec.version(),
            }));
        }
        if self.pos >= vec.len() {
            return None;
        }
        let item = vec.get(self.pos);
        self.pos += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged::PagedVecBuilder;
    use crate::store::MemoryPageStore;

    fn filled(items: &[u32]) -> PagedVec<u32, MemoryPageStore<u32>> {
        let mut vec = PagedVecBuilder::new()
            .cache_pages(2)
            .create(MemoryPageStore::new(2))
            .unwrap();
        vec.push_all(items.iter().copied()).unwrap();
        vec
    }

    #[test]
    fn walks_all_elements_in_order() {
        let mut vec = filled(&[1, 2, 3, 4, 5]);
        let mut cursor = vec.cursor();
        let mut seen = Vec::new();
        while let Some(item) = cursor.next(&mut vec) {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert!(cursor.next(&mut vec).is_none(), "stays exhausted");
    }

    #[test]
    fn structural_mutation_fails_the_cursor() {
        let mut vec = filled(&[1, 2, 3]);
        let mut cursor = vec.cursor();
        assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 1);

        vec.push(4).unwrap();
        let err = cursor.next(&mut vec).unwrap().unwrap_err();
        assert!(matches!(err, PagedError::Mutated { .. }));
    }

    #[test]
    fn in_place_overwrite_keeps_cursor_valid() {
        let mut vec = filled(&[1, 2, 3]);
        let mut cursor = vec.cursor();
        assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 1);

        vec.set(2, 99).unwrap();
        assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 2);
        assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 99);
    }

    #[test]
    fn empty_array_yields_nothing() {
        let mut vec = filled(&[]);
        let mut cursor = vec.cursor();
        assert!(cursor.next(&mut vec).is_none());
    }
}
