//! Page store contract.
//!
//! A [`PageStore`] is a flat sequence of fixed-size chunks plus one metadata
//! record. The paged array is the only writer; it reads chunks on faults,
//! writes them back on eviction and flush, and grows/shrinks the chunk tail
//! as pages are appended or trimmed.

use crate::error::Result;

/// Rounds a requested page size up to the next power of two, with a floor
/// of 2. Power-of-two pages let element addressing use shifts and masks.
pub fn normalize_page_size(requested: u32) -> u32 {
    requested.next_power_of_two().max(2)
}

/// Metadata persisted alongside the chunks.
///
/// `page_size` is in elements and is always a power of two. `len` is the
/// logical element count of the whole array; the element count of chunk `i`
/// follows from `len` and `page_size`, so chunks can be stored at their full
/// physical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page_size: u32,
    pub len: u64,
    pub version: u64,
}

impl PageMeta {
    pub fn empty(page_size: u32) -> Self {
        Self {
            page_size,
            len: 0,
            version: 0,
        }
    }
}

/// Backing storage for a paged array.
///
/// Chunks are addressed by dense index `0..chunk_count()`. Stores persist
/// chunks at their full physical size; the logical tail length is derived
/// from [`PageMeta::len`] by the caller.
pub trait PageStore<T> {
    /// Reads chunk `index` into `buf`, which arrives sized to the physical
    /// page size. Missing chunks and decode failures are errors.
    fn read_chunk(&mut self, index: u32, buf: &mut [T]) -> Result<()>;

    /// Overwrites chunk `index`. Writing one past the end appends.
    fn write_chunk(&mut self, index: u32, data: &[T]) -> Result<()>;

    /// Appends a chunk, returning its index.
    fn append_chunk(&mut self, data: &[T]) -> Result<u32>;

    /// Drops the highest-indexed chunk.
    fn remove_last_chunk(&mut self) -> Result<()>;

    fn read_meta(&mut self) -> Result<PageMeta>;

    fn write_meta(&mut self, meta: &PageMeta) -> Result<()>;

    /// Forces buffered writes to the underlying medium.
    fn flush(&mut self) -> Result<()>;

    fn chunk_count(&self) -> u32;

    /// Deletes every chunk and resets the metadata, keeping `page_size`.
    fn wipe(&mut self) -> Result<()>;
}
