//! File-backed [`PageStore`] with checksummed records.
//!
//! ## On-disk layout
//!
//! ```text
//! ┌──────────────────────────── header (40 bytes) ────────────────────────┐
//! │ magic "PGV1" │ format u16 │ pad u16 │ page_size u32 │ elem_width u32  │
//! │ chunk_count u32 │ len u64 │ version u64 │ crc32 of bytes 0..36        │
//! └───────────────────────────────────────────────────────────────────────┘
//! ┌─ chunk 0 ────────────────────┐┌─ chunk 1 ────────────────────┐
//! │ crc32 │ page_size × WIDTH    ││ crc32 │ page_size × WIDTH    │ ...
//! └──────────────────────────────┘└──────────────────────────────┘
//! ```
//!
//! Every chunk record is the full physical page; the logical tail length
//! lives in the header's `len`. Records are fixed-size so chunk `i` sits at
//! a computed offset and reads/writes use positioned I/O, never a seek
//! cursor. Each record carries a CRC32 of its payload; a mismatch on read
//! surfaces as [`PagedError::Corruption`] rather than silently handing back
//! garbage.
//!
//! The header is rewritten on every structural change (append, trim, meta
//! update). Durability is only guaranteed after [`PageStore::flush`], which
//! maps to `fsync`.

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::error::{PagedError, Result};
use crate::store::codec::{decode_slice, encode_slice, FixedElement};
use crate::store::traits::{normalize_page_size, PageMeta, PageStore};

const MAGIC: [u8; 4] = *b"PGV1";
const FORMAT: u16 = 1;
const HEADER_LEN: u64 = 40;
const CRC_LEN: u64 = 4;

/// Positioned-I/O page store over a single file.
pub struct FilePageStore<T> {
    file: File,
    page_size: u32,
    chunk_count: u32,
    meta: PageMeta,
    scratch: Vec<u8>,
    _elem: PhantomData<T>,
}

impl<T: FixedElement> FilePageStore<T> {
    /// Creates a fresh store, truncating any existing file. The page size
    /// is normalized to a power of two no smaller than 2.
    pub fn create(path: impl AsRef<Path>, page_size: u32) -> Result<Self> {
        let page_size = normalize_page_size(page_size);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut store = Self {
            file,
            page_size,
            chunk_count: 0,
            meta: PageMeta::empty(page_size),
            scratch: Vec::new(),
            _elem: PhantomData,
        };
        store.persist_header()?;
        Ok(store)
    }

    /// Opens an existing store, validating magic, format, and element width.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut raw = [0u8; HEADER_LEN as usize];
        file.read_exact_at(&mut raw, 0)?;

        if raw[0..4] != MAGIC {
            return Err(PagedError::Corruption("bad magic".to_string()));
        }
        let stored_crc = u32::from_le_bytes(raw[36..40].try_into().expect("fixed slice"));
        if crc32fast::hash(&raw[0..36]) != stored_crc {
            return Err(PagedError::Corruption("header checksum mismatch".to_string()));
        }
        let format = u16::from_le_bytes(raw[4..6].try_into().expect("fixed slice"));
        if format != FORMAT {
            return Err(PagedError::Corruption(format!(
                "unsupported format {format}"
            )));
        }
        let elem_width = u32::from_le_bytes(raw[12..16].try_into().expect("fixed slice"));
        if elem_width as usize != T::WIDTH {
            return Err(PagedError::Corruption(format!(
                "element width mismatch: file has {elem_width}, expected {}",
                T::WIDTH
            )));
        }

        let page_size = u32::from_le_bytes(raw[8..12].try_into().expect("fixed slice"));
        let chunk_count = u32::from_le_bytes(raw[16..20].try_into().expect("fixed slice"));
        let len = u64::from_le_bytes(raw[20..28].try_into().expect("fixed slice"));
        let version = u64::from_le_bytes(raw[28..36].try_into().expect("fixed slice"));

        Ok(Self {
            file,
            page_size,
            chunk_count,
            meta: PageMeta {
                page_size,
                len,
                version,
            },
            scratch: Vec::new(),
            _elem: PhantomData,
        })
    }

    /// Opens `path` if it exists, otherwise creates a fresh store.
    pub fn open_or_create(path: impl AsRef<Path>, page_size: u32) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path, page_size)
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn record_len(&self) -> u64 {
        CRC_LEN + self.page_size as u64 * T::WIDTH as u64
    }

    fn chunk_offset(&self, index: u32) -> u64 {
        HEADER_LEN + index as u64 * self.record_len()
    }

    fn persist_header(&mut self) -> Result<()> {
        let mut raw = [0u8; HEADER_LEN as usize];
        raw[0..4].copy_from_slice(&MAGIC);
        raw[4..6].copy_from_slice(&FORMAT.to_le_bytes());
        raw[8..12].copy_from_slice(&self.page_size.to_le_bytes());
        raw[12..16].copy_from_slice(&(T::WIDTH as u32).to_le_bytes());
        raw[16..20].copy_from_slice(&self.chunk_count.to_le_bytes());
        raw[20..28].copy_from_slice(&self.meta.len.to_le_bytes());
        raw[28..36].copy_from_slice(&self.meta.version.to_le_bytes());
        let crc = crc32fast::hash(&raw[0..36]);
        raw[36..40].copy_from_slice(&crc.to_le_bytes());
        self.file.write_all_at(&raw, 0)?;
        Ok(())
    }

    fn put_chunk(&mut self, index: u32, data: &[T]) -> Result<()> {
        let payload_len = self.page_size as usize * T::WIDTH;
        encode_slice(data, &mut self.scratch);
        // Short tails pad out to the physical page size with zero bytes.
        self.scratch.resize(payload_len, 0);

        let crc = crc32fast::hash(&self.scratch);
        let offset = self.chunk_offset(index);
        self.file.write_all_at(&crc.to_le_bytes(), offset)?;
        self.file.write_all_at(&self.scratch, offset + CRC_LEN)?;
        Ok(())
    }
}

impl<T: FixedElement + Default> PageStore<T> for FilePageStore<T> {
    fn read_chunk(&mut self, index: u32, buf: &mut [T]) -> Result<()> {
        if index >= self.chunk_count {
            return Err(PagedError::Corruption(format!(
                "chunk {index} missing, store has {}",
                self.chunk_count
            )));
        }
        let payload_len = self.page_size as usize * T::WIDTH;
        let offset = self.chunk_offset(index);

        let mut crc_raw = [0u8; CRC_LEN as usize];
        self.file.read_exact_at(&mut crc_raw, offset)?;
        self.scratch.resize(payload_len, 0);
        self.file.read_exact_at(&mut self.scratch, offset + CRC_LEN)?;

        let stored = u32::from_le_bytes(crc_raw);
        if crc32fast::hash(&self.scratch) != stored {
            return Err(PagedError::Corruption(format!(
                "chunk {index} checksum mismatch"
            )));
        }

        let take = buf.len().min(self.page_size as usize);
        decode_slice(&self.scratch[..take * T::WIDTH], &mut buf[..take]);
        for slot in buf[take..].iter_mut() {
            *slot = T::default();
        }
        Ok(())
    }

    fn write_chunk(&mut self, index: u32, data: &[T]) -> Result<()> {
        if index > self.chunk_count {
            return Err(PagedError::Corruption(format!(
                "write to chunk {index} would leave a hole, store has {}",
                self.chunk_count
            )));
        }
        self.put_chunk(index, data)?;
        if index == self.chunk_count {
            self.chunk_count += 1;
            self.persist_header()?;
        }
        Ok(())
    }

    fn append_chunk(&mut self, data: &[T]) -> Result<u32> {
        let index = self.chunk_count;
        self.put_chunk(index, data)?;
        self.chunk_count += 1;
        self.persist_header()?;
        Ok(index)
    }

    fn remove_last_chunk(&mut self) -> Result<()> {
        if self.chunk_count == 0 {
            return Err(PagedError::Corruption(
                "remove_last_chunk on empty store".to_string(),
            ));
        }
        self.chunk_count -= 1;
        self.file.set_len(self.chunk_offset(self.chunk_count))?;
        self.persist_header()?;
        Ok(())
    }

    fn read_meta(&mut self) -> Result<PageMeta> {
        Ok(self.meta)
    }

    fn write_meta(&mut self, meta: &PageMeta) -> Result<()> {
        if meta.page_size != self.page_size {
            return Err(PagedError::InvalidConfig(format!(
                "page size {} does not match store page size {}",
                meta.page_size, self.page_size
            )));
        }
        self.meta = *meta;
        self.persist_header()
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    fn wipe(&mut self) -> Result<()> {
        self.chunk_count = 0;
        self.meta = PageMeta::empty(self.page_size);
        self.file.set_len(HEADER_LEN)?;
        self.persist_header()
    }
}

impl<T> std::fmt::Debug for FilePageStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePageStore")
            .field("page_size", &self.page_size)
            .field("chunk_count", &self.chunk_count)
            .field("meta", &self.meta)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_write_reopen_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.pgv");
        {
            let mut store: FilePageStore<u32> = FilePageStore::create(&path, 4).unwrap();
            store.append_chunk(&[1, 2, 3, 4]).unwrap();
            store.append_chunk(&[5, 6, 7, 8]).unwrap();
            store
                .write_meta(&PageMeta {
                    page_size: 4,
                    len: 8,
                    version: 3,
                })
                .unwrap();
            store.flush().unwrap();
        }

        let mut store: FilePageStore<u32> = FilePageStore::open(&path).unwrap();
        assert_eq!(store.chunk_count(), 2);
        assert_eq!(
            store.read_meta().unwrap(),
            PageMeta {
                page_size: 4,
                len: 8,
                version: 3
            }
        );
        let mut buf = vec![0u32; 4];
        store.read_chunk(1, &mut buf).unwrap();
        assert_eq!(buf, vec![5, 6, 7, 8]);
    }

    #[test]
    fn short_tail_pads_to_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tail.pgv");
        let mut store: FilePageStore<u16> = FilePageStore::create(&path, 8).unwrap();
        store.append_chunk(&[10, 20, 30]).unwrap();

        let mut buf = vec![0u16; 8];
        store.read_chunk(0, &mut buf).unwrap();
        assert_eq!(buf, vec![10, 20, 30, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn corrupt_payload_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.pgv");
        let mut store: FilePageStore<u32> = FilePageStore::create(&path, 2).unwrap();
        store.append_chunk(&[1, 2]).unwrap();

        // Flip a payload byte behind the store's back.
        let offset = HEADER_LEN + CRC_LEN;
        store.file.write_all_at(&[0xFF], offset).unwrap();

        let mut buf = vec![0u32; 2];
        let err = store.read_chunk(0, &mut buf).unwrap_err();
        assert!(matches!(err, PagedError::Corruption(_)));
    }

    #[test]
    fn wrong_element_width_refuses_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("width.pgv");
        {
            let _store: FilePageStore<u32> = FilePageStore::create(&path, 2).unwrap();
        }
        let err = FilePageStore::<u64>::open(&path).unwrap_err();
        assert!(matches!(err, PagedError::Corruption(_)));
    }

    #[test]
    fn garbage_file_refuses_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.pgv");
        std::fs::write(&path, b"definitely not a page file, padded out!!").unwrap();
        let err = FilePageStore::<u8>::open(&path).unwrap_err();
        assert!(matches!(err, PagedError::Corruption(_)));
    }

    #[test]
    fn page_size_is_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("norm.pgv");
        let store = FilePageStore::<u8>::create(&path, 3).unwrap();
        assert_eq!(store.page_size(), 4);
        let store = FilePageStore::<u8>::create(&path, 0).unwrap();
        assert_eq!(store.page_size(), 2);
    }

    #[test]
    fn remove_last_chunk_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trim.pgv");
        let mut store: FilePageStore<u8> = FilePageStore::create(&path, 2).unwrap();
        store.append_chunk(&[1, 2]).unwrap();
        store.append_chunk(&[3, 4]).unwrap();
        store.remove_last_chunk().unwrap();
        assert_eq!(store.chunk_count(), 1);

        let mut buf = vec![0u8; 2];
        assert!(store.read_chunk(1, &mut buf).is_err());
        store.read_chunk(0, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 2]);

        assert!(store.remove_last_chunk().is_ok());
        assert!(store.remove_last_chunk().is_err());
    }

    #[test]
    fn wipe_keeps_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wipe.pgv");
        let mut store: FilePageStore<u8> = FilePageStore::create(&path, 4).unwrap();
        store.append_chunk(&[1, 2, 3, 4]).unwrap();
        store.wipe().unwrap();
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(store.read_meta().unwrap(), PageMeta::empty(4));
    }
}
