pub use crate::alloc::{HeapAllocator, PoolAllocator};
pub use crate::cache::{LfuCache, SharedLfuCache};
pub use crate::ds::{FrequencyLadder, DEFAULT_THRESHOLDS};
pub use crate::error::{PagedError, Result};
pub use crate::paged::{Chunk, Cursor, PagedVec, PagedVecBuilder};
pub use crate::store::{
    FilePageStore, FixedElement, MemoryPageStore, PageMeta, PageStore, StoreCounters,
};
pub use crate::traits::{ArrayAllocator, Clock, ManualClock, SystemClock};
