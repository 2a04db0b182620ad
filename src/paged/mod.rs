//! Disk-paged random-access array.
//!
//! [`PagedVec`] presents a flat `Vec`-like surface over a [`PageStore`],
//! keeping only a bounded set of pages in memory. Pages fault in on access,
//! are tracked by the approximate LFU engine in [`crate::cache`], and write
//! back to the store when evicted or flushed.
//!
//! ```text
//! logical index ──► page index = i >> step_base
//!                   offset     = i & (page_size - 1)
//!
//! ┌────────────────────────── PagedVec<T, S> ──────────────────────────┐
//! │                                                                    │
//! │  cache: LfuCache<u32, Chunk<T>>      store: S (all pages)          │
//! │  ┌──────┬──────────────────┐        ┌───┬───┬───┬───┬───┐          │
//! │  │ pg 0 │ [a b c d] dirty  │        │ 0 │ 1 │ 2 │ 3 │ 4 │          │
//! │  │ pg 3 │ [m n o p] clean  │        └───┴───┴───┴───┴───┘          │
//! │  └──────┴──────────────────┘          ▲ eviction writes dirty      │
//! │                                         pages back before discard  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write transactions
//!
//! Every mutating operation runs inside a write transaction. Transactions
//! nest by depth counting: [`begin_write`](PagedVec::begin_write) increments,
//! [`end_write`](PagedVec::end_write) decrements, and when the depth returns
//! to zero the metadata and all resident dirty pages flush to the store in
//! ascending page order. Standalone mutations open and close their own
//! transaction, so the store is consistent after every public call unless
//! the caller has explicitly batched.
//!
//! ## Structural versioning
//!
//! A version counter increments on every structural mutation (push, insert,
//! remove, truncate, grow, reorder). [`Cursor`](crate::paged::Cursor)s
//! capture the version at creation and fail with [`PagedError::Mutated`]
//! when it changes mid-enumeration. Overwriting an element in place with
//! [`set`](PagedVec::set) is not structural and does not invalidate cursors.
//!
//! # Example
//!
//! ```
//! use pagedvec::paged::PagedVecBuilder;
//! use pagedvec::store::MemoryPageStore;
//!
//! let store: MemoryPageStore<u32> = MemoryPageStore::new(4);
//! let mut vec = PagedVecBuilder::new().cache_pages(2).create(store).unwrap();
//!
//! for i in 0..10 {
//!     vec.push(i).unwrap();
//! }
//! assert_eq!(vec.len(), 10);
//! assert_eq!(vec.get(7).unwrap(), 7);
//! assert_eq!(vec.page_count(), 3);
//! ```

pub mod chunk;
pub mod cursor;

pub use chunk::Chunk;
pub use cursor::Cursor;

use std::cmp::Ordering;
use std::ops::ControlFlow;

use crate::alloc::HeapAllocator;
use crate::cache::LfuCache;
use crate::error::{PagedError, Result};
use crate::store::{PageMeta, PageStore};
use crate::traits::ArrayAllocator;

type ModifiedCheck<T> = Box<dyn Fn(&Chunk<T>) -> bool>;
type DisposeHook<T> = Box<dyn FnMut(&mut Chunk<T>)>;

/// Paged array over a [`PageStore`]. See the module docs.
pub struct PagedVec<T, S> {
    store: S,
    cache: LfuCache<u32, Chunk<T>>,
    alloc: Box<dyn ArrayAllocator<T>>,
    modified_check: Option<ModifiedCheck<T>>,
    on_dispose: Option<DisposeHook<T>>,
    page_size: usize,
    step_base: usize,
    len: usize,
    page_count: u32,
    version: u64,
    write_depth: u32,
}

/// Writes one evicted page back to the store and recycles its buffer.
///
/// A free function rather than a method so the eviction closure can borrow
/// the store and allocator while the cache itself is mutably borrowed.
fn write_back<T, S: PageStore<T>>(
    store: &mut S,
    alloc: &mut dyn ArrayAllocator<T>,
    modified_check: Option<&(dyn Fn(&Chunk<T>) -> bool)>,
    on_dispose: &mut Option<DisposeHook<T>>,
    index: u32,
    mut chunk: Chunk<T>,
) -> Result<()> {
    let must_write = chunk.dirty || modified_check.is_some_and(|f| f(&chunk));
    if must_write {
        store.write_chunk(index, &chunk.buf)?;
    }
    if let Some(hook) = on_dispose {
        hook(&mut chunk);
    }
    alloc.recycle(chunk.buf, true);
    Ok(())
}

impl<T, S> PagedVec<T, S>
where
    T: Clone + Default,
    S: PageStore<T>,
{
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical page size in elements (a power of two).
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages the array currently spans.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Structural version; bumps on every structural mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pages currently resident in memory.
    pub fn resident_pages(&self) -> usize {
        self.cache.len()
    }

    /// Read-only view of the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable view of the backing store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(PagedError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn page_of(&self, index: usize) -> (u32, usize) {
        ((index >> self.step_base) as u32, index & (self.page_size - 1))
    }

    fn logical_page_len(&self, page: u32) -> usize {
        let start = page as usize * self.page_size;
        self.len.saturating_sub(start).min(self.page_size)
    }

    // -- page lifecycle ----------------------------------------------------

    /// Inserts a resident page, letting the cache evict (and write back)
    /// whatever has to make room.
    fn insert_chunk(&mut self, index: u32, chunk: Chunk<T>) -> Result<()> {
        let Self {
            store,
            cache,
            alloc,
            modified_check,
            on_dispose,
            ..
        } = self;
        cache.put_with(index, chunk, |idx, evicted| {
            write_back(store, alloc.as_mut(), modified_check.as_deref(), on_dispose, idx, evicted)
        })?;
        Ok(())
    }

    fn fault_in(&mut self, index: u32) -> Result<()> {
        let mut buf = self.alloc.rent(self.page_size);
        if let Err(err) = self.store.read_chunk(index, &mut buf) {
            self.alloc.recycle(buf, false);
            return Err(err);
        }
        let chunk = Chunk {
            buf,
            len: self.logical_page_len(index),
            dirty: false,
        };
        self.insert_chunk(index, chunk)
    }

    /// Resident page handle, faulting it in from the store if needed.
    /// Counts as a cache access.
    fn chunk_mut(&mut self, index: u32) -> Result<&mut Chunk<T>> {
        if !self.cache.contains(&index) {
            self.fault_in(index)?;
        }
        Ok(self
            .cache
            .try_get_mut(&index)
            .expect("page resident after fault"))
    }

    /// Appends a fresh page to both the store and the cache. The store copy
    /// is written eagerly so page indexes are always dense on disk.
    fn new_page(&mut self) -> Result<()> {
        let buf = self.alloc.rent(self.page_size);
        let index = self.store.append_chunk(&buf)?;
        debug_assert_eq!(index, self.page_count);
        let chunk = Chunk {
            buf,
            len: 0,
            dirty: false,
        };
        if let Err(err) = self.insert_chunk(index, chunk) {
            // The insert can fail in the eviction write-back; take the
            // appended chunk back out so the store stays dense at
            // `page_count` chunks.
            let _ = self.store.remove_last_chunk();
            return Err(err);
        }
        self.page_count += 1;
        Ok(())
    }

    fn drop_last_page(&mut self) -> Result<()> {
        if self.page_count == 0 {
            return Ok(());
        }
        let index = self.page_count - 1;
        if let Some(mut chunk) = self.cache.remove(&index) {
            if let Some(hook) = &mut self.on_dispose {
                hook(&mut chunk);
            }
            self.alloc.recycle(chunk.buf, true);
        }
        self.store.remove_last_chunk()?;
        self.page_count -= 1;
        Ok(())
    }

    // -- transactions ------------------------------------------------------

    /// Opens a write transaction; nests by depth counting.
    pub fn begin_write(&mut self) {
        self.write_depth += 1;
    }

    /// Closes a write transaction. When the outermost transaction closes,
    /// metadata and all resident dirty pages flush to the store. Calling
    /// with no open transaction just flushes again, which is harmless:
    /// already-clean pages are not rewritten.
    pub fn end_write(&mut self) -> Result<()> {
        if self.write_depth > 0 {
            self.write_depth -= 1;
        }
        if self.write_depth == 0 {
            self.flush()?;
        }
        Ok(())
    }

    fn with_write<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.begin_write();
        let out = f(self);
        let closed = self.end_write();
        let value = out?;
        closed?;
        Ok(value)
    }

    /// Writes metadata and every resident dirty page to the store, then
    /// forces the store to the medium. Pages stay resident and are marked
    /// clean, so a second flush writes nothing.
    pub fn flush(&mut self) -> Result<()> {
        let meta = PageMeta {
            page_size: self.page_size as u32,
            len: self.len as u64,
            version: self.version,
        };
        self.store.write_meta(&meta)?;

        let mut dirty: Vec<u32> = self
            .cache
            .iter()
            .filter(|(_, chunk)| chunk.dirty)
            .map(|(idx, _)| *idx)
            .collect();
        dirty.sort_unstable();

        let Self { store, cache, .. } = self;
        for index in dirty {
            if let Some(chunk) = cache.peek_mut(&index) {
                store.write_chunk(index, &chunk.buf)?;
                chunk.dirty = false;
            }
        }
        self.store.flush()?;
        Ok(())
    }

    // -- element access ----------------------------------------------------

    /// Reads the element at `index`, faulting its page in if needed.
    pub fn get(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;
        let (page, off) = self.page_of(index);
        let chunk = self.chunk_mut(page)?;
        Ok(chunk.buf[off].clone())
    }

    /// Overwrites the element at `index` in place. Not a structural
    /// mutation: cursors stay valid.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index)?;
        self.with_write(|v| {
            let (page, off) = v.page_of(index);
            let chunk = v.chunk_mut(page)?;
            chunk.buf[off] = value;
            chunk.dirty = true;
            Ok(())
        })
    }

    /// Appends an element.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.with_write(|v| v.push_inner(value))
    }

    fn push_inner(&mut self, value: T) -> Result<()> {
        let (page, off) = self.page_of(self.len);
        if page == self.page_count {
            self.new_page()?;
        }
        let chunk = self.chunk_mut(page)?;
        chunk.buf[off] = value;
        chunk.len = off + 1;
        chunk.dirty = true;
        self.len += 1;
        self.version += 1;
        Ok(())
    }

    /// Appends every element from `items` inside a single transaction.
    pub fn push_all(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.with_write(|v| {
            for item in items {
                v.push_inner(item)?;
            }
            Ok(())
        })
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Result<Option<T>> {
        if self.len == 0 {
            return Ok(None);
        }
        let index = self.len - 1;
        self.with_write(|v| {
            let (page, off) = v.page_of(index);
            let value = {
                let chunk = v.chunk_mut(page)?;
                let value = chunk.buf[off].clone();
                chunk.len = off;
                chunk.dirty = true;
                value
            };
            v.len = index;
            v.version += 1;
            if off == 0 {
                v.drop_last_page()?;
            }
            Ok(Some(value))
        })
    }

    /// Inserts `value` at `index`, rippling displaced elements through the
    /// following pages: each full page sheds its last element, which becomes
    /// the carry inserted at the front of the next page.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(PagedError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if index == self.len {
            return self.push(value);
        }
        self.with_write(|v| {
            v.version += 1;
            let page_size = v.page_size;
            let (mut page, mut off) = v.page_of(index);
            let mut carry = value;
            loop {
                let plen = v.logical_page_len(page);
                let chunk = v.chunk_mut(page)?;
                if plen < page_size {
                    // Room in this page: shift the tail right one slot.
                    let mut j = plen;
                    while j > off {
                        chunk.buf[j] = chunk.buf[j - 1].clone();
                        j -= 1;
                    }
                    chunk.buf[off] = carry;
                    chunk.len = plen + 1;
                    chunk.dirty = true;
                    break;
                }
                // Full page: the last element carries into the next page.
                let overflow = chunk.buf[page_size - 1].clone();
                let mut j = page_size - 1;
                while j > off {
                    chunk.buf[j] = chunk.buf[j - 1].clone();
                    j -= 1;
                }
                chunk.buf[off] = carry;
                chunk.dirty = true;
                carry = overflow;
                off = 0;
                page += 1;
                if page == v.page_count {
                    v.new_page()?;
                }
            }
            v.len += 1;
            Ok(())
        })
    }

    /// Removes and returns the element at `index`, shifting the remainder
    /// left across page boundaries. An emptied trailing page is dropped
    /// from both the cache and the store.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;
        self.with_write(|v| {
            v.version += 1;
            let page_size = v.page_size;
            let last_page = ((v.len - 1) >> v.step_base) as u32;
            let (mut page, mut off) = v.page_of(index);
            let removed = {
                let chunk = v.chunk_mut(page)?;
                chunk.buf[off].clone()
            };
            loop {
                let plen = v.logical_page_len(page);
                let chunk = v.chunk_mut(page)?;
                for j in off..plen.saturating_sub(1) {
                    chunk.buf[j] = chunk.buf[j + 1].clone();
                }
                chunk.dirty = true;
                if page == last_page {
                    chunk.len = plen - 1;
                    break;
                }
                // Pull the next page's first element into the freed slot.
                let next_first = v.chunk_mut(page + 1)?.buf[0].clone();
                let chunk = v.chunk_mut(page)?;
                chunk.buf[page_size - 1] = next_first;
                page += 1;
                off = 0;
            }
            v.len -= 1;
            if v.len <= (v.page_count as usize - 1) * page_size {
                v.drop_last_page()?;
            }
            Ok(removed)
        })
    }

    /// Grows the array to at least `size` elements, filling with defaults.
    /// No-op when already that long; use [`truncate`](Self::truncate) to
    /// shrink.
    pub fn ensure(&mut self, size: usize) -> Result<()>
    where
        T: PartialEq,
    {
        self.ensure_with(size, T::default())
    }

    /// Grows the array to at least `size` elements, filling new slots with
    /// `value`. Growth by whole pages of the default value skips the
    /// per-element fill: fresh pages are already default-filled.
    pub fn ensure_with(&mut self, size: usize, value: T) -> Result<()>
    where
        T: PartialEq,
    {
        if size <= self.len {
            return Ok(());
        }
        self.with_write(|v| {
            v.version += 1;
            let page_size = v.page_size;
            // Fill out the current partial tail page explicitly; its slots
            // may hold values left behind by an earlier truncate.
            while v.len < size && (v.len & (page_size - 1)) != 0 {
                let (page, off) = v.page_of(v.len);
                let chunk = v.chunk_mut(page)?;
                chunk.buf[off] = value.clone();
                chunk.len = off + 1;
                chunk.dirty = true;
                v.len += 1;
            }
            let fill = value != T::default();
            while v.len < size {
                let (page, _) = v.page_of(v.len);
                if page == v.page_count {
                    v.new_page()?;
                }
                let take = page_size.min(size - v.len);
                let chunk = v.chunk_mut(page)?;
                if fill {
                    for slot in chunk.buf[..take].iter_mut() {
                        *slot = value.clone();
                    }
                    chunk.dirty = true;
                }
                chunk.len = take;
                v.len += take;
            }
            Ok(())
        })
    }

    /// Shortens the array to `new_len`; no-op when already shorter.
    pub fn truncate(&mut self, new_len: usize) -> Result<()> {
        if new_len >= self.len {
            return Ok(());
        }
        self.with_write(|v| {
            v.version += 1;
            v.truncate_inner(new_len)
        })
    }

    fn truncate_inner(&mut self, new_len: usize) -> Result<()> {
        self.len = new_len;
        let needed = if new_len == 0 {
            0
        } else {
            ((new_len - 1) >> self.step_base) as u32 + 1
        };
        while self.page_count > needed {
            self.drop_last_page()?;
        }
        if new_len > 0 {
            let last = self.page_count - 1;
            let logical = self.logical_page_len(last);
            if let Some(chunk) = self.cache.peek_mut(&last) {
                chunk.len = logical;
            }
        }
        Ok(())
    }

    /// Drops every element and wipes the store.
    pub fn clear(&mut self) -> Result<()> {
        let resident: Vec<u32> = self.cache.keys().copied().collect();
        for index in resident {
            if let Some(mut chunk) = self.cache.remove(&index) {
                if let Some(hook) = &mut self.on_dispose {
                    hook(&mut chunk);
                }
                self.alloc.recycle(chunk.buf, true);
            }
        }
        self.store.wipe()?;
        self.len = 0;
        self.page_count = 0;
        self.version += 1;
        self.flush()
    }

    // -- bulk reads --------------------------------------------------------

    /// Clones the whole array out, in order.
    pub fn to_vec(&mut self) -> Result<Vec<T>> {
        self.collect_inner()
    }

    /// Visits every element in order; `Break` stops early.
    pub fn for_each(&mut self, mut f: impl FnMut(&T) -> ControlFlow<()>) -> Result<()> {
        for page in 0..self.page_count {
            let chunk = self.chunk_mut(page)?;
            for item in chunk.items() {
                if let ControlFlow::Break(()) = f(item) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Enumeration handle bound to the current structural version.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.version)
    }

    // -- reordering --------------------------------------------------------

    /// Reverses the array in place.
    pub fn reverse(&mut self) -> Result<()> {
        if self.len <= 1 {
            return Ok(());
        }
        self.with_write(|v| {
            v.version += 1;
            if v.page_count == 1 {
                let chunk = v.chunk_mut(0)?;
                let len = chunk.len;
                chunk.buf[..len].reverse();
                chunk.dirty = true;
                return Ok(());
            }
            let mut all = v.collect_inner()?;
            all.reverse();
            v.write_all(&all)
        })
    }

    /// Sorts the array with a comparator. Single-page arrays sort in place;
    /// larger arrays materialize, sort, and write every page back.
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&T, &T) -> Ordering) -> Result<()> {
        if self.len <= 1 {
            return Ok(());
        }
        self.with_write(|v| {
            v.version += 1;
            if v.page_count == 1 {
                let chunk = v.chunk_mut(0)?;
                let len = chunk.len;
                chunk.buf[..len].sort_unstable_by(&mut cmp);
                chunk.dirty = true;
                return Ok(());
            }
            let mut all = v.collect_inner()?;
            all.sort_unstable_by(&mut cmp);
            v.write_all(&all)
        })
    }

    /// Sorts the array ascending.
    pub fn sort(&mut self) -> Result<()>
    where
        T: Ord,
    {
        self.sort_by(T::cmp)
    }

    fn collect_inner(&mut self) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.len);
        for page in 0..self.page_count {
            let chunk = self.chunk_mut(page)?;
            out.extend_from_slice(chunk.items());
        }
        Ok(out)
    }

    fn write_all(&mut self, items: &[T]) -> Result<()> {
        debug_assert_eq!(items.len(), self.len);
        let page_size = self.page_size;
        for page in 0..self.page_count {
            let start = page as usize * page_size;
            let end = (start + page_size).min(items.len());
            let chunk = self.chunk_mut(page)?;
            chunk.buf[..end - start].clone_from_slice(&items[start..end]);
            chunk.dirty = true;
        }
        Ok(())
    }

    // -- searching ---------------------------------------------------------

    /// Binary search over the whole array with a probe function, as
    /// [`slice::binary_search_by`]: `Ok(i)` is a match, `Err(i)` the sorted
    /// insertion point. The outer `Result` carries page I/O failures.
    pub fn binary_search_by(
        &mut self,
        mut probe: impl FnMut(&T) -> Ordering,
    ) -> Result<std::result::Result<usize, usize>> {
        self.binary_search_range(0, self.len, &mut probe)
    }

    /// Binary search over `count` elements starting at `start`.
    pub fn binary_search_in(
        &mut self,
        start: usize,
        count: usize,
        target: &T,
    ) -> Result<std::result::Result<usize, usize>>
    where
        T: Ord,
    {
        if start + count > self.len {
            return Err(PagedError::RangeOutOfBounds {
                start,
                count,
                len: self.len,
            });
        }
        self.binary_search_range(start, start + count, &mut |item: &T| item.cmp(target))
    }

    /// Binary search for `target` in an ascending-sorted array.
    pub fn binary_search(&mut self, target: &T) -> Result<std::result::Result<usize, usize>>
    where
        T: Ord,
    {
        self.binary_search_by(|item| item.cmp(target))
    }

    fn binary_search_range(
        &mut self,
        mut lo: usize,
        mut hi: usize,
        probe: &mut impl FnMut(&T) -> Ordering,
    ) -> Result<std::result::Result<usize, usize>> {
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let item = self.get(mid)?;
            match probe(&item) {
                Ordering::Less => lo = mid + 1,
                Ordering::Equal => return Ok(Ok(mid)),
                Ordering::Greater => hi = mid,
            }
        }
        Ok(Err(lo))
    }

    // -- teardown ----------------------------------------------------------

    /// Flushes everything, releases resident pages, and hands the store
    /// back.
    pub fn close(mut self) -> Result<S> {
        self.flush()?;
        let resident: Vec<u32> = self.cache.keys().copied().collect();
        for index in resident {
            if let Some(mut chunk) = self.cache.remove(&index) {
                if let Some(hook) = &mut self.on_dispose {
                    hook(&mut chunk);
                }
                self.alloc.recycle(chunk.buf, true);
            }
        }
        Ok(self.store)
    }
}

impl<T, S> std::fmt::Debug for PagedVec<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedVec")
            .field("len", &self.len)
            .field("page_size", &self.page_size)
            .field("page_count", &self.page_count)
            .field("version", &self.version)
            .finish()
    }
}

/// Builder for [`PagedVec`]. The physical page size comes from the store;
/// the builder configures the memory side: cache budget, ladder thresholds,
/// allocator, and the page lifecycle hooks.
pub struct PagedVecBuilder<T> {
    cache_pages: u64,
    thresholds: Option<Vec<u64>>,
    allocator: Option<Box<dyn ArrayAllocator<T>>>,
    modified_check: Option<ModifiedCheck<T>>,
    on_dispose: Option<DisposeHook<T>>,
}

impl<T> PagedVecBuilder<T>
where
    T: Clone + Default,
{
    pub fn new() -> Self {
        Self {
            cache_pages: 16,
            thresholds: None,
            allocator: None,
            modified_check: None,
            on_dispose: None,
        }
    }

    /// Maximum resident pages; at least 1. Defaults to 16.
    pub fn cache_pages(mut self, pages: u64) -> Self {
        self.cache_pages = pages;
        self
    }

    /// Custom ladder thresholds for the page cache.
    pub fn thresholds(mut self, thresholds: &[u64]) -> Self {
        self.thresholds = Some(thresholds.to_vec());
        self
    }

    /// Buffer allocator for page buffers. Defaults to [`HeapAllocator`].
    pub fn allocator(mut self, alloc: impl ArrayAllocator<T> + 'static) -> Self {
        self.allocator = Some(Box::new(alloc));
        self
    }

    /// Extra write-back predicate: an evicted page also writes back when
    /// this returns `true`, even if the dirty flag is unset. For element
    /// types with interior mutability the dirty flag alone cannot see.
    pub fn modified_check(mut self, check: impl Fn(&Chunk<T>) -> bool + 'static) -> Self {
        self.modified_check = Some(Box::new(check));
        self
    }

    /// Hook run on every page leaving memory, after any write-back and
    /// before its buffer is recycled.
    pub fn on_dispose(mut self, hook: impl FnMut(&mut Chunk<T>) + 'static) -> Self {
        self.on_dispose = Some(Box::new(hook));
        self
    }

    /// Starts an empty array on `store`, wiping whatever it held.
    pub fn create<S: PageStore<T>>(self, mut store: S) -> Result<PagedVec<T, S>> {
        store.wipe()?;
        let meta = store.read_meta()?;
        self.build(store, meta, 0)
    }

    /// Opens the array persisted in `store`.
    pub fn open<S: PageStore<T>>(self, mut store: S) -> Result<PagedVec<T, S>> {
        let meta = store.read_meta()?;
        let page_count = store.chunk_count();
        let expected = if meta.len == 0 {
            0
        } else {
            (meta.len - 1) / meta.page_size as u64 + 1
        };
        if page_count as u64 != expected {
            return Err(PagedError::Corruption(format!(
                "store has {page_count} chunks but length {} needs {expected}",
                meta.len
            )));
        }
        self.build(store, meta, page_count)
    }

    fn build<S: PageStore<T>>(
        self,
        store: S,
        meta: PageMeta,
        page_count: u32,
    ) -> Result<PagedVec<T, S>> {
        let page_size = meta.page_size as usize;
        if page_size < 2 || !page_size.is_power_of_two() {
            return Err(PagedError::InvalidConfig(format!(
                "store page size {page_size} is not a power of two >= 2"
            )));
        }
        if self.cache_pages == 0 {
            return Err(PagedError::InvalidConfig(
                "cache must hold at least one page".to_string(),
            ));
        }

        let mut cache = match &self.thresholds {
            Some(t) => LfuCache::with_thresholds(t)?,
            None => LfuCache::new(),
        };
        cache.track_cost(self.cache_pages, |_, _| 1)?;

        Ok(PagedVec {
            store,
            cache,
            alloc: self
                .allocator
                .unwrap_or_else(|| Box::new(HeapAllocator::new())),
            modified_check: self.modified_check,
            on_dispose: self.on_dispose,
            page_size,
            step_base: page_size.trailing_zeros() as usize,
            len: meta.len as usize,
            page_count,
            version: meta.version,
            write_depth: 0,
        })
    }
}

impl<T> Default for PagedVecBuilder<T>
where
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
