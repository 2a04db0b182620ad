//! In-memory [`PageStore`], mostly for tests and ephemeral use.
//!
//! Keeps chunks as owned vectors and counts every store operation, so tests
//! can assert on write-back behavior (e.g. that a flush with no dirty pages
//! performs zero chunk writes). Single-shot fault injection covers the I/O
//! error paths.

use crate::error::{PagedError, Result};
use crate::store::traits::{normalize_page_size, PageMeta, PageStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounters {
    pub chunk_reads: u64,
    pub chunk_writes: u64,
    pub meta_writes: u64,
    pub flushes: u64,
}

/// Chunk store backed by `Vec<Vec<T>>`.
#[derive(Debug)]
pub struct MemoryPageStore<T> {
    chunks: Vec<Vec<T>>,
    meta: PageMeta,
    counters: StoreCounters,
    fail_read_after: Option<u32>,
    fail_write_after: Option<u32>,
}

impl<T: Clone + Default> MemoryPageStore<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            chunks: Vec::new(),
            meta: PageMeta::empty(normalize_page_size(page_size)),
            counters: StoreCounters::default(),
            fail_read_after: None,
            fail_write_after: None,
        }
    }

    pub fn counters(&self) -> StoreCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = StoreCounters::default();
    }

    /// Makes the next chunk read fail with an I/O error.
    pub fn fail_next_read(&mut self) {
        self.fail_read_after = Some(0);
    }

    /// Makes the next chunk write fail with an I/O error.
    pub fn fail_next_write(&mut self) {
        self.fail_write_after = Some(0);
    }

    /// Lets `skip` chunk writes through, then fails the one after.
    pub fn fail_write_after(&mut self, skip: u32) {
        self.fail_write_after = Some(skip);
    }

    /// Direct chunk view, bypassing the counters.
    pub fn chunk(&self, index: u32) -> Option<&[T]> {
        self.chunks.get(index as usize).map(|c| c.as_slice())
    }

    fn injected(countdown: &mut Option<u32>, what: &str) -> Result<()> {
        match countdown {
            Some(0) => {
                *countdown = None;
                Err(PagedError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("injected {what} fault"),
                )))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<T: Clone + Default> PageStore<T> for MemoryPageStore<T> {
    fn read_chunk(&mut self, index: u32, buf: &mut [T]) -> Result<()> {
        Self::injected(&mut self.fail_read_after, "read")?;
        self.counters.chunk_reads += 1;
        let chunk = self.chunks.get(index as usize).ok_or_else(|| {
            PagedError::Corruption(format!("chunk {index} missing, store has {}", self.chunks.len()))
        })?;
        let take = chunk.len().min(buf.len());
        buf[..take].clone_from_slice(&chunk[..take]);
        for slot in buf[take..].iter_mut() {
            *slot = T::default();
        }
        Ok(())
    }

    fn write_chunk(&mut self, index: u32, data: &[T]) -> Result<()> {
        Self::injected(&mut self.fail_write_after, "write")?;
        self.counters.chunk_writes += 1;
        let index = index as usize;
        if index < self.chunks.len() {
            self.chunks[index] = data.to_vec();
            Ok(())
        } else if index == self.chunks.len() {
            self.chunks.push(data.to_vec());
            Ok(())
        } else {
            Err(PagedError::Corruption(format!(
                "write to chunk {index} would leave a hole, store has {}",
                self.chunks.len()
            )))
        }
    }

    fn append_chunk(&mut self, data: &[T]) -> Result<u32> {
        Self::injected(&mut self.fail_write_after, "append")?;
        self.counters.chunk_writes += 1;
        self.chunks.push(data.to_vec());
        Ok((self.chunks.len() - 1) as u32)
    }

    fn remove_last_chunk(&mut self) -> Result<()> {
        if self.chunks.pop().is_none() {
            return Err(PagedError::Corruption(
                "remove_last_chunk on empty store".to_string(),
            ));
        }
        Ok(())
    }

    fn read_meta(&mut self) -> Result<PageMeta> {
        Ok(self.meta)
    }

    fn write_meta(&mut self, meta: &PageMeta) -> Result<()> {
        self.counters.meta_writes += 1;
        self.meta = *meta;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.counters.flushes += 1;
        Ok(())
    }

    fn chunk_count(&self) -> u32 {
        self.chunks.len() as u32
    }

    fn wipe(&mut self) -> Result<()> {
        self.chunks.clear();
        self.meta = PageMeta::empty(self.meta.page_size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_round_trip_with_counters() {
        let mut store: MemoryPageStore<u32> = MemoryPageStore::new(4);
        store.write_chunk(0, &[1, 2, 3, 4]).unwrap();
        let mut buf = vec![0u32; 4];
        store.read_chunk(0, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4]);
        assert_eq!(store.counters().chunk_writes, 1);
        assert_eq!(store.counters().chunk_reads, 1);
    }

    #[test]
    fn holes_are_rejected() {
        let mut store: MemoryPageStore<u8> = MemoryPageStore::new(2);
        assert!(store.write_chunk(3, &[0, 0]).is_err());
    }

    #[test]
    fn short_chunk_reads_pad_with_default() {
        let mut store: MemoryPageStore<u8> = MemoryPageStore::new(4);
        store.write_chunk(0, &[9, 9]).unwrap();
        let mut buf = vec![7u8; 4];
        store.read_chunk(0, &mut buf).unwrap();
        assert_eq!(buf, vec![9, 9, 0, 0]);
    }

    #[test]
    fn injected_faults_fire_once() {
        let mut store: MemoryPageStore<u8> = MemoryPageStore::new(2);
        store.write_chunk(0, &[1, 2]).unwrap();
        store.fail_next_read();
        let mut buf = vec![0u8; 2];
        assert!(store.read_chunk(0, &mut buf).is_err());
        assert!(store.read_chunk(0, &mut buf).is_ok());
    }

    #[test]
    fn write_fault_countdown_skips_then_fires() {
        let mut store: MemoryPageStore<u8> = MemoryPageStore::new(2);
        store.fail_write_after(1);
        assert!(store.write_chunk(0, &[1, 2]).is_ok());
        assert!(store.write_chunk(0, &[3, 4]).is_err());
        assert!(store.write_chunk(0, &[5, 6]).is_ok());
    }

    #[test]
    fn wipe_resets_chunks_and_meta() {
        let mut store: MemoryPageStore<u8> = MemoryPageStore::new(2);
        store.append_chunk(&[1, 2]).unwrap();
        store
            .write_meta(&PageMeta {
                page_size: 2,
                len: 2,
                version: 5,
            })
            .unwrap();
        store.wipe().unwrap();
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(store.read_meta().unwrap(), PageMeta::empty(2));
    }
}
