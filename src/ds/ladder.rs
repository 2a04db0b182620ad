//! Fixed frequency ladder for approximate O(1) LFU tracking.
//!
//! Classical O(1) LFU keeps one bucket per *distinct* frequency value and
//! creates/destroys buckets as counters move. This ladder trades that
//! exactness for a fixed set of rungs built once at construction from an
//! ascending threshold sequence (default Fibonacci-like): a key promotes one
//! rung whenever its access count exceeds the rung's threshold, so every
//! promotion is a single hop and every eviction scan is bounded by the
//! constant rung count.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                       FrequencyLadder<K> Layout                      │
//! │                                                                      │
//! │  index: FxHashMap<K, EntryId>      nodes: slot arena of Node<K>      │
//! │  ┌─────────┬─────────┐            ┌──────┬─────────────────────────┐ │
//! │  │ "pg_0"  │  id_2   │───────────►│ id_2 │ count:1, rung:0, links  │ │
//! │  │ "pg_7"  │  id_0   │───────────►│ id_0 │ count:4, rung:2, links  │ │
//! │  └─────────┴─────────┘            └──────┴─────────────────────────┘ │
//! │                                                                      │
//! │  rungs (fixed, never reallocated after construction):                │
//! │                                                                      │
//! │   [0] thr=1   tail ─► id_2 ◄─ head        ◄── evict from here first  │
//! │   [1] thr=2   (empty)                                                │
//! │   [2] thr=3   tail ─► id_0 ◄─ head        ◄── top (most frequent)    │
//! │   [3] thr=5   (empty)                                                │
//! │    ⋮                                                                 │
//! │                                                                      │
//! │  Within a rung: FIFO list, head = newest arrival, tail = oldest.     │
//! │  Eviction pops the tail of the lowest non-empty rung.                │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The source design linked rungs in a circular ring around a sentinel; here
//! the ring is an arena (`Box<[Rung]>`) and "next rung" is `rung + 1`, which
//! removes ownership ambiguity without changing behavior. Rung membership is
//! the only thing that mutates; thresholds and rung count are immutable.
//!
//! | Operation       | Time        | Notes                                 |
//! |-----------------|-------------|---------------------------------------|
//! | `insert`        | O(1)        | New key starts in the first rung      |
//! | `record_access` | O(1)        | At most one hop up the ladder         |
//! | `pop_least`     | O(#rungs)   | Bounded by the fixed rung count       |
//! | `remove`        | O(1)        |                                       |
//! | `collect_stale` | O(budget)   | Walks from the top rung downward      |

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::error::{PagedError, Result};

/// Default rung thresholds: Fibonacci-like growth so low frequencies get
/// fine-grained rungs while hot keys saturate in a handful of hops.
pub const DEFAULT_THRESHOLDS: [u64; 15] = [
    1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryId(usize);

#[derive(Debug)]
struct Node<K> {
    // Hot fields first: links move on every touch and eviction.
    prev: Option<EntryId>,
    next: Option<EntryId>,
    rung: usize,
    count: u64,
    stamp: u64,
    key: K,
}

#[derive(Debug)]
struct Rung {
    threshold: u64,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl Rung {
    fn empty(threshold: u64) -> Self {
        Self {
            threshold,
            head: None,
            tail: None,
            len: 0,
        }
    }
}

/// Fixed-rung frequency tracker. See the module docs for the layout.
///
/// # Example
///
/// ```
/// use pagedvec::ds::FrequencyLadder;
///
/// let mut ladder = FrequencyLadder::with_thresholds(&[1, 2, 3]).unwrap();
/// ladder.insert("a", 0);
/// ladder.insert("b", 0);
///
/// // Second access pushes "a" past threshold 1 into the next rung.
/// ladder.record_access(&"a", 0);
/// assert_eq!(ladder.rung_of(&"a"), Some(1));
/// assert_eq!(ladder.rung_of(&"b"), Some(0));
///
/// // Eviction drains the lowest rung first.
/// assert_eq!(ladder.pop_least(), Some(("b", 1)));
/// assert_eq!(ladder.pop_least(), Some(("a", 2)));
/// ```
#[derive(Debug)]
pub struct FrequencyLadder<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    live: usize,
    index: FxHashMap<K, EntryId>,
    rungs: Box<[Rung]>,
    /// Highest rung index currently holding entries; meaningless when empty.
    top: usize,
}

impl<K> FrequencyLadder<K>
where
    K: Eq + Hash + Clone,
{
    /// Builds a ladder with the default Fibonacci-like thresholds.
    pub fn new() -> Self {
        Self::with_thresholds(&DEFAULT_THRESHOLDS)
            .expect("default thresholds are valid")
    }

    /// Builds a ladder from a custom threshold sequence.
    ///
    /// Thresholds must be non-empty, start at 1 or above, and be strictly
    /// ascending; otherwise [`PagedError::InvalidConfig`] is returned.
    pub fn with_thresholds(thresholds: &[u64]) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(PagedError::InvalidConfig(
                "ladder thresholds must not be empty".to_string(),
            ));
        }
        if thresholds[0] == 0 {
            return Err(PagedError::InvalidConfig(
                "ladder thresholds must start at 1 or above".to_string(),
            ));
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PagedError::InvalidConfig(
                "ladder thresholds must be strictly ascending".to_string(),
            ));
        }

        Ok(Self {
            nodes: Vec::new(),
            free: Vec::new(),
            live: 0,
            index: FxHashMap::default(),
            rungs: thresholds.iter().map(|&t| Rung::empty(t)).collect(),
            top: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of rungs (fixed at construction).
    pub fn rung_count(&self) -> usize {
        self.rungs.len()
    }

    /// Rung index a key currently occupies (0 = least frequent).
    pub fn rung_of(&self, key: &K) -> Option<usize> {
        let id = *self.index.get(key)?;
        self.node(id).map(|n| n.rung)
    }

    /// Access count for a key.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.node(id).map(|n| n.count)
    }

    /// Last access stamp recorded for a key.
    pub fn last_access(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.node(id).map(|n| n.stamp)
    }

    /// Tracks a new key in the first rung with an access count of 1.
    ///
    /// Returns `false` (without touching state) if the key is already
    /// tracked; use [`record_access`](Self::record_access) for that.
    pub fn insert(&mut self, key: K, stamp: u64) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let node = Node {
            prev: None,
            next: None,
            rung: 0,
            count: 1,
            stamp,
            key: key.clone(),
        };
        let id = self.alloc_node(node);
        self.index.insert(key, id);
        self.push_front(0, id);
        self.live += 1;
        if self.live == 1 {
            self.top = 0;
        }
        true
    }

    /// Bumps a key's access count, promoting it one rung when the count
    /// exceeds the current rung's threshold. Returns the new count.
    pub fn record_access(&mut self, key: &K, stamp: u64) -> Option<u64> {
        let id = *self.index.get(key)?;
        let (rung, count) = {
            let node = self.node_mut(id)?;
            node.count += 1;
            node.stamp = stamp;
            (node.rung, node.count)
        };

        let promote = count > self.rungs[rung].threshold && rung + 1 < self.rungs.len();
        if promote {
            self.unlink(rung, id);
            let was_top_emptied = rung == self.top && self.rungs[rung].len == 0;
            let dest = rung + 1;
            if let Some(node) = self.node_mut(id) {
                node.rung = dest;
            }
            self.push_front(dest, id);
            if dest > self.top || was_top_emptied {
                self.top = dest;
            }
        }
        Some(count)
    }

    /// Overwrites the last-access stamp without counting an access.
    pub fn set_stamp(&mut self, key: &K, stamp: u64) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        match self.node_mut(id) {
            Some(node) => {
                node.stamp = stamp;
                true
            }
            None => false,
        }
    }

    /// Zeroes every entry's last-access stamp.
    pub fn reset_stamps(&mut self) {
        for slot in self.nodes.iter_mut().flatten() {
            slot.stamp = 0;
        }
    }

    /// Removes and returns the least-frequent key: the oldest entry in the
    /// lowest non-empty rung. Ties within a rung break in arrival order.
    pub fn pop_least(&mut self) -> Option<(K, u64)> {
        self.pop_least_excluding(None)
    }

    /// Like [`pop_least`](Self::pop_least) but skips over `protect` if it
    /// happens to be the victim, taking the next-oldest candidate instead.
    pub fn pop_least_excluding(&mut self, protect: Option<&K>) -> Option<(K, u64)> {
        if self.live == 0 {
            return None;
        }
        for rung in 0..self.rungs.len() {
            let mut cursor = self.rungs[rung].tail;
            while let Some(id) = cursor {
                let node = self.node(id)?;
                let shielded = protect.is_some_and(|p| *p == node.key);
                if shielded {
                    cursor = node.prev;
                    continue;
                }
                let key = node.key.clone();
                let count = node.count;
                self.detach(&key, id, rung);
                return Some((key, count));
            }
        }
        None
    }

    /// Key that [`pop_least`](Self::pop_least) would evict next.
    pub fn peek_least(&self) -> Option<&K> {
        if self.live == 0 {
            return None;
        }
        for rung in self.rungs.iter() {
            if let Some(id) = rung.tail {
                return self.node(id).map(|n| &n.key);
            }
        }
        None
    }

    /// Stops tracking a key. Returns `false` if it was not tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        let Some(rung) = self.node(id).map(|n| n.rung) else {
            return false;
        };
        let key = key.clone();
        self.detach(&key, id, rung);
        true
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.live = 0;
        self.top = 0;
        for rung in self.rungs.iter_mut() {
            rung.head = None;
            rung.tail = None;
            rung.len = 0;
        }
    }

    /// Walks rungs from the most-frequent end downward, pushing keys whose
    /// `now - stamp` exceeds `window` into `out`, examining at most `budget`
    /// entries. Returns the number of keys collected.
    ///
    /// Walking hot-first is deliberate: hot keys that went idle are exactly
    /// the ones plain capacity pressure would never reach.
    pub fn collect_stale(
        &self,
        now: u64,
        window: u64,
        budget: usize,
        out: &mut Vec<K>,
    ) -> usize {
        if self.live == 0 || budget == 0 {
            return 0;
        }
        let mut examined = 0usize;
        let mut collected = 0usize;
        let mut rung = self.top;
        loop {
            let mut cursor = self.rungs[rung].head;
            while let Some(id) = cursor {
                let Some(node) = self.node(id) else {
                    break;
                };
                if now.saturating_sub(node.stamp) > window {
                    out.push(node.key.clone());
                    collected += 1;
                }
                examined += 1;
                if examined >= budget {
                    return collected;
                }
                cursor = node.next;
            }
            if rung == 0 {
                break;
            }
            rung -= 1;
        }
        collected
    }

    /// Iterates tracked keys with their counts, lowest rung first, oldest
    /// entry within a rung first (the eviction order).
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.rungs.iter().flat_map(move |rung| RungIter {
            ladder: self,
            cursor: rung.tail,
        })
    }

    // -- arena plumbing ----------------------------------------------------

    fn node(&self, id: EntryId) -> Option<&Node<K>> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: EntryId) -> Option<&mut Node<K>> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    fn alloc_node(&mut self, node: Node<K>) -> EntryId {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                EntryId(idx)
            }
            None => {
                self.nodes.push(Some(node));
                EntryId(self.nodes.len() - 1)
            }
        }
    }

    fn detach(&mut self, key: &K, id: EntryId, rung: usize) {
        self.unlink(rung, id);
        self.nodes[id.0] = None;
        self.free.push(id.0);
        self.index.remove(key);
        self.live -= 1;
        if self.live > 0 && rung == self.top && self.rungs[rung].len == 0 {
            self.retreat_top();
        }
    }

    fn retreat_top(&mut self) {
        let mut rung = self.top;
        while rung > 0 && self.rungs[rung].len == 0 {
            rung -= 1;
        }
        self.top = rung;
    }

    fn push_front(&mut self, rung: usize, id: EntryId) {
        let old_head = self.rungs[rung].head;
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head_id) = old_head {
            if let Some(head) = self.node_mut(head_id) {
                head.prev = Some(id);
            }
        } else {
            self.rungs[rung].tail = Some(id);
        }
        self.rungs[rung].head = Some(id);
        self.rungs[rung].len += 1;
    }

    fn unlink(&mut self, rung: usize, id: EntryId) {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev_id) => {
                if let Some(p) = self.node_mut(prev_id) {
                    p.next = next;
                }
            }
            None => self.rungs[rung].head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(n) = self.node_mut(next_id) {
                    n.prev = prev;
                }
            }
            None => self.rungs[rung].tail = prev,
        }
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
        self.rungs[rung].len -= 1;
    }
}

impl<K> Default for FrequencyLadder<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

struct RungIter<'a, K> {
    ladder: &'a FrequencyLadder<K>,
    cursor: Option<EntryId>,
}

impl<'a, K> Iterator for RungIter<'a, K>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.ladder.node(id)?;
        self.cursor = node.prev;
        Some((&node.key, node.count))
    }
}
