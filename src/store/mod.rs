//! Backing stores for the paged array.
//!
//! [`PageStore`] is the contract; [`MemoryPageStore`] keeps chunks on the
//! heap and [`FilePageStore`] persists them to a single checksummed file
//! using the fixed-width codec in [`codec`].

pub mod codec;
pub mod file;
pub mod memory;
pub mod traits;

pub use codec::FixedElement;
pub use file::FilePageStore;
pub use memory::{MemoryPageStore, StoreCounters};
pub use traits::{normalize_page_size, PageMeta, PageStore};
