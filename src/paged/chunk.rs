//! Resident page representation.

/// One page held in memory: the physical buffer, the logical element count
/// (the tail page is usually shorter than the buffer), and a dirty flag set
/// on every write so clean pages evict without touching the store.
#[derive(Debug)]
pub struct Chunk<T> {
    pub(crate) buf: Vec<T>,
    pub(crate) len: usize,
    pub(crate) dirty: bool,
}

impl<T> Chunk<T> {
    /// Live elements of the page.
    pub fn items(&self) -> &[T] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the page has unwritten changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
