//! End-to-end behavior of the paged array over an in-memory store.

use std::ops::ControlFlow;

use proptest::prelude::*;

use pagedvec::paged::{PagedVec, PagedVecBuilder};
use pagedvec::store::{MemoryPageStore, PageStore};
use pagedvec::PagedError;

fn build(page_size: u32, cache_pages: u64) -> PagedVec<u32, MemoryPageStore<u32>> {
    PagedVecBuilder::new()
        .cache_pages(cache_pages)
        .create(MemoryPageStore::new(page_size))
        .unwrap()
}

#[test]
fn append_then_read_back_across_pages() {
    let mut vec = build(4, 2);
    for i in 0..10u32 {
        vec.push(i).unwrap();
    }
    assert_eq!(vec.len(), 10);
    assert_eq!(vec.page_count(), 3);
    for i in 0..10u32 {
        assert_eq!(vec.get(i as usize).unwrap(), i);
    }
    // Reads in reverse fault the same pages without disturbing contents.
    for i in (0..10u32).rev() {
        assert_eq!(vec.get(i as usize).unwrap(), i);
    }
}

#[test]
fn insert_ripples_carry_through_full_pages() {
    let mut vec = build(2, 4);
    vec.push_all([1, 2, 3, 4]).unwrap();

    vec.insert_at(1, 99).unwrap();

    assert_eq!(vec.to_vec().unwrap(), vec![1, 99, 2, 3, 4]);
    // Each full page shed its last element into the next page.
    assert_eq!(vec.store().chunk(0).unwrap(), &[1, 99]);
    assert_eq!(vec.store().chunk(1).unwrap(), &[2, 3]);
    assert_eq!(vec.store().chunk(2).unwrap()[0], 4);
}

#[test]
fn eviction_writes_dirty_page_back_before_flush() {
    let mut vec = build(4, 1);
    vec.begin_write();
    vec.push_all(0..8u32).unwrap();
    // Budget of one page: creating page 1 evicted dirty page 0, which must
    // have been written back even though the transaction is still open.
    assert_eq!(vec.store().chunk(0).unwrap(), &[0, 1, 2, 3]);
    vec.end_write().unwrap();
    assert_eq!(vec.store().chunk(1).unwrap(), &[4, 5, 6, 7]);
}

#[test]
fn clean_pages_evict_without_store_writes() {
    let mut vec = build(4, 1);
    vec.push_all(0..16u32).unwrap();
    let baseline = vec.store().counters().chunk_writes;

    // Pure reads churn pages through the one-slot cache; clean evictions
    // must not write.
    for i in 0..16 {
        vec.get(i).unwrap();
    }
    assert_eq!(vec.store().counters().chunk_writes, baseline);
}

#[test]
fn end_write_is_idempotent() {
    let mut vec = build(4, 4);
    vec.begin_write();
    vec.push_all(0..10u32).unwrap();
    vec.end_write().unwrap();

    let after_first = vec.store().counters();
    vec.end_write().unwrap();
    let after_second = vec.store().counters();
    assert_eq!(
        after_first.chunk_writes, after_second.chunk_writes,
        "nothing is dirty, so a second close writes no chunks"
    );

    vec.flush().unwrap();
    assert_eq!(vec.store().counters().chunk_writes, after_first.chunk_writes);
}

#[test]
fn nested_transactions_flush_once_at_depth_zero() {
    let mut vec = build(4, 4);
    vec.begin_write();
    vec.begin_write();
    vec.push(1).unwrap();
    vec.end_write().unwrap();
    // Depth is still 1: metadata must not have been flushed yet.
    let flushes_mid = vec.store().counters().flushes;
    vec.end_write().unwrap();
    assert!(vec.store().counters().flushes > flushes_mid);
    assert_eq!(vec.store_mut().read_meta().unwrap().len, 1);
}

#[test]
fn cursor_detects_mutation_mid_enumeration() {
    let mut vec = build(2, 2);
    vec.push_all([10, 20, 30, 40]).unwrap();

    let mut cursor = vec.cursor();
    assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 10);
    assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 20);

    vec.insert_at(0, 5).unwrap();
    let err = cursor.next(&mut vec).unwrap().unwrap_err();
    assert!(matches!(err, PagedError::Mutated { .. }));

    // A fresh cursor sees the new shape.
    let mut cursor = vec.cursor();
    assert_eq!(cursor.next(&mut vec).unwrap().unwrap(), 5);
}

#[test]
fn for_each_and_to_vec_agree() {
    let mut vec = build(2, 2);
    vec.push_all(0..9u32).unwrap();
    let mut walked = Vec::new();
    vec.for_each(|&item| {
        walked.push(item);
        ControlFlow::Continue(())
    })
    .unwrap();
    assert_eq!(walked, vec.to_vec().unwrap());
}

#[test]
fn sort_then_binary_search_multi_page() {
    let mut vec = build(4, 2);
    vec.push_all([42, 7, 19, 3, 88, 51, 64, 12, 9, 27]).unwrap();
    vec.sort().unwrap();

    let sorted = vec.to_vec().unwrap();
    assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

    for (i, &value) in sorted.iter().enumerate() {
        assert_eq!(vec.binary_search(&value).unwrap(), Ok(i));
    }
    assert_eq!(vec.binary_search(&1000).unwrap(), Err(10));
}

#[test]
fn write_transaction_batches_and_survives_reopen() {
    let mut vec = build(4, 2);
    vec.begin_write();
    for i in 0..20u32 {
        vec.push(i * 2).unwrap();
    }
    vec.set(3, 999).unwrap();
    vec.remove_at(0).unwrap();
    vec.end_write().unwrap();

    let expected = vec.to_vec().unwrap();
    let store = vec.close().unwrap();

    let mut reopened: PagedVec<u32, _> =
        PagedVecBuilder::new().cache_pages(2).open(store).unwrap();
    assert_eq!(reopened.to_vec().unwrap(), expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random mutation sequences stay equivalent to a plain `Vec`.
    #[test]
    fn matches_vec_model(
        page_size in prop_oneof![Just(2u32), Just(4u32), Just(8u32)],
        cache_pages in 1u64..4,
        ops in prop::collection::vec((0u8..5, 0usize..64, any::<u32>()), 1..80),
    ) {
        let mut vec = build(page_size, cache_pages);
        let mut model: Vec<u32> = Vec::new();

        for (op, pos, value) in ops {
            match op {
                0 => {
                    vec.push(value).unwrap();
                    model.push(value);
                }
                1 if !model.is_empty() => {
                    let at = pos % model.len();
                    prop_assert_eq!(vec.remove_at(at).unwrap(), model.remove(at));
                }
                2 => {
                    let at = pos % (model.len() + 1);
                    vec.insert_at(at, value).unwrap();
                    model.insert(at, value);
                }
                3 if !model.is_empty() => {
                    let at = pos % model.len();
                    vec.set(at, value).unwrap();
                    model[at] = value;
                }
                4 => {
                    prop_assert_eq!(vec.pop().unwrap(), model.pop());
                }
                _ => {}
            }
            prop_assert_eq!(vec.len(), model.len());
        }

        prop_assert_eq!(vec.to_vec().unwrap(), model.clone());
        let needed = if model.is_empty() {
            0
        } else {
            (model.len() - 1) as u32 / page_size + 1
        };
        prop_assert_eq!(vec.page_count(), needed);
        prop_assert_eq!(vec.store().chunk_count(), needed);
    }
}
