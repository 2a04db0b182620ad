//! Approximate LFU cache built on the fixed frequency ladder.
//!
//! [`LfuCache`] owns the values and delegates all frequency bookkeeping to a
//! [`FrequencyLadder`]; the two structures always track the same key set.
//! On top of the plain get/put surface it layers two optional regimes:
//!
//! - **Cost budgeting** ([`track_cost`](LfuCache::track_cost)): every entry
//!   carries a cost computed by a caller-supplied function, and inserts
//!   evict in ladder order while the running total would exceed the budget.
//!   An item costlier than the whole budget is rejected outright.
//! - **Obsolescence tracking**
//!   ([`start_tracking_obsolescence`](LfuCache::start_tracking_obsolescence)):
//!   a [`Clock`] stamps every access, a periodic
//!   [`scan_for_obsolescence`](LfuCache::scan_for_obsolescence) marks entries
//!   idle for longer than the staleness window, and marked entries become
//!   the preferred eviction victims (they are stale regardless of how hot
//!   they once were).
//!
//! Evictions that must not lose data take an `on_evict` callback which runs
//! *before* the value is discarded; if it fails the error propagates and the
//! triggering operation is abandoned. This is how the paged array writes
//! dirty pages back to its store.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           LfuCache<K, V>                          │
//! │                                                                   │
//! │   values: FxHashMap<K, V>         ladder: FrequencyLadder<K>      │
//! │   ┌────────┬─────────┐           rung 0 (thr 1): [k3]             │
//! │   │  k1    │  v1     │           rung 1 (thr 2): [k1]             │
//! │   │  k3    │  v3     │           rung 2 (thr 3): []               │
//! │   └────────┴─────────┘                                            │
//! │                                                                   │
//! │   obsolete: {k3}      ◄── evicted first, before ladder order      │
//! │   total_cost: 12 / budget: 16                                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::ds::FrequencyLadder;
use crate::error::{PagedError, Result};
use crate::traits::Clock;

type CostFn<K, V> = Box<dyn Fn(&K, &V) -> u64 + Send>;

/// Approximate LFU cache. See the module docs for the eviction regimes.
///
/// # Example
///
/// ```
/// use pagedvec::cache::LfuCache;
///
/// let mut cache = LfuCache::with_thresholds(&[1, 2, 3]).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
///
/// // Touch "a" so it outranks "b".
/// assert_eq!(cache.try_get(&"a"), Some(&1));
///
/// let (victim, _) = cache.pop_least().unwrap();
/// assert_eq!(victim, "b");
/// ```
pub struct LfuCache<K, V> {
    values: FxHashMap<K, V>,
    ladder: FrequencyLadder<K>,
    clock: Option<Box<dyn Clock + Send>>,
    stale_after: u64,
    obsolete: FxHashSet<K>,
    /// 0 means cost tracking is off.
    budget: u64,
    total_cost: u64,
    cost_fn: Option<CostFn<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Cache with the default Fibonacci-like ladder thresholds.
    pub fn new() -> Self {
        Self::from_ladder(FrequencyLadder::new())
    }

    /// Cache with custom ladder thresholds; see
    /// [`FrequencyLadder::with_thresholds`] for validity rules.
    pub fn with_thresholds(thresholds: &[u64]) -> Result<Self> {
        Ok(Self::from_ladder(FrequencyLadder::with_thresholds(
            thresholds,
        )?))
    }

    fn from_ladder(ladder: FrequencyLadder<K>) -> Self {
        Self {
            values: FxHashMap::default(),
            ladder,
            clock: None,
            stale_after: 0,
            obsolete: FxHashSet::default(),
            budget: 0,
            total_cost: 0,
            cost_fn: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Access count recorded for a resident key.
    pub fn frequency_of(&self, key: &K) -> Option<u64> {
        self.ladder.frequency(key)
    }

    /// Last access stamp recorded for a resident key (0 when no clock is
    /// installed).
    pub fn last_access_of(&self, key: &K) -> Option<u64> {
        self.ladder.last_access(key)
    }

    fn now(&self) -> u64 {
        self.clock.as_ref().map_or(0, |c| c.ticks())
    }

    fn cost_of(&self, key: &K, value: &V) -> u64 {
        match &self.cost_fn {
            Some(f) => f(key, value),
            None => 0,
        }
    }

    // -- lookups -----------------------------------------------------------

    /// Looks a key up, counting the access. A hit clears any obsolescence
    /// mark: a touched entry is no longer stale.
    pub fn try_get(&mut self, key: &K) -> Option<&V> {
        if !self.values.contains_key(key) {
            return None;
        }
        let now = self.now();
        self.ladder.record_access(key, now);
        self.obsolete.remove(key);
        self.values.get(key)
    }

    /// Mutable lookup, counting the access.
    ///
    /// Mutating a value through this handle does not re-evaluate its cost;
    /// callers that change an entry's cost must reinsert it with
    /// [`put_with`](Self::put_with).
    pub fn try_get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.values.contains_key(key) {
            return None;
        }
        let now = self.now();
        self.ladder.record_access(key, now);
        self.obsolete.remove(key);
        self.values.get_mut(key)
    }

    /// Lookup that leaves frequency, stamps, and obsolescence untouched.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Mutable lookup without any bookkeeping. Used for maintenance passes
    /// (e.g. flushing) that must not distort access frequencies.
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        self.values.get_mut(key)
    }

    // -- inserts and eviction ----------------------------------------------

    /// Inserts or replaces a value; evictions discard silently.
    ///
    /// Returns `true` when the key was already present.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.put_with(key, value, |_, _| Ok(()))
            .expect("infallible eviction callback")
    }

    /// Inserts or replaces a value, running `on_evict` for every entry that
    /// has to make room. The callback runs before the victim is discarded;
    /// an error aborts the insert and propagates.
    ///
    /// Replacing an existing key counts as an access. With cost tracking on,
    /// a value costlier than the entire budget is rejected with
    /// [`PagedError::CostOverBudget`].
    pub fn put_with(
        &mut self,
        key: K,
        value: V,
        mut on_evict: impl FnMut(K, V) -> Result<()>,
    ) -> Result<bool> {
        let cost = self.cost_of(&key, &value);
        if self.budget > 0 && cost > self.budget {
            return Err(PagedError::CostOverBudget {
                cost,
                budget: self.budget,
            });
        }

        if self.values.contains_key(&key) {
            let old_cost = match self.values.get(&key) {
                Some(old) => self.cost_of(&key, old),
                None => 0,
            };
            // The old value stays accounted until eviction succeeds; only
            // the cost *growth* needs room. A failed eviction then leaves
            // the totals matching exactly what is still resident.
            self.make_room(cost.saturating_sub(old_cost), Some(&key), &mut on_evict)?;
            self.total_cost = self.total_cost - old_cost + cost;
            let now = self.now();
            self.ladder.record_access(&key, now);
            self.obsolete.remove(&key);
            self.values.insert(key, value);
            return Ok(true);
        }

        self.make_room(cost, None, &mut on_evict)?;
        self.total_cost += cost;
        let now = self.now();
        self.ladder.insert(key.clone(), now);
        self.values.insert(key, value);
        Ok(false)
    }

    /// Evicts until `incoming` more cost fits under the budget. Marked
    /// obsolete entries go first, then plain ladder order. `protect` is the
    /// key being updated in place; it must not evict itself.
    fn make_room(
        &mut self,
        incoming: u64,
        protect: Option<&K>,
        on_evict: &mut impl FnMut(K, V) -> Result<()>,
    ) -> Result<()> {
        if self.budget == 0 {
            return Ok(());
        }
        while self.total_cost + incoming > self.budget {
            let victim = self.pick_victim(protect);
            let Some(key) = victim else {
                // Nothing evictable: only the protected key remains.
                break;
            };
            self.evict_one(&key, on_evict)?;
        }
        Ok(())
    }

    fn pick_victim(&mut self, protect: Option<&K>) -> Option<K> {
        let marked = self
            .obsolete
            .iter()
            .find(|k| protect != Some(*k))
            .cloned();
        if marked.is_some() {
            return marked;
        }
        // Peek rather than pop: evict_one owns the actual removal.
        let candidate = self.ladder.peek_least()?.clone();
        if protect == Some(&candidate) {
            // Re-run the scan skipping the protected key.
            return self
                .ladder
                .iter()
                .map(|(k, _)| k)
                .find(|k| protect != Some(*k))
                .cloned();
        }
        Some(candidate)
    }

    fn evict_one(&mut self, key: &K, on_evict: &mut impl FnMut(K, V) -> Result<()>) -> Result<()> {
        let Some(value) = self.values.remove(key) else {
            return Ok(());
        };
        let cost = self.cost_of(key, &value);
        // Unhook all bookkeeping before the callback so the cache stays
        // internally consistent even if write-back fails.
        self.ladder.remove(key);
        self.obsolete.remove(key);
        self.total_cost = self.total_cost.saturating_sub(cost);
        on_evict(key.clone(), value)?;
        Ok(())
    }

    /// Removes and returns the next eviction victim without any callback.
    pub fn pop_least(&mut self) -> Option<(K, V)> {
        let (key, _) = self.ladder.pop_least()?;
        let value = self.values.remove(&key)?;
        let cost = self.cost_of(&key, &value);
        self.obsolete.remove(&key);
        self.total_cost = self.total_cost.saturating_sub(cost);
        Some((key, value))
    }

    /// Evicts the least-used entries through `on_evict`.
    ///
    /// `count: Some(n)` evicts up to `n` entries in ladder order.
    /// `count: None` drains exactly the lowest non-empty rung, however many
    /// entries it holds. Returns the number evicted.
    pub fn remove_least_used_with(
        &mut self,
        count: Option<usize>,
        mut on_evict: impl FnMut(K, V) -> Result<()>,
    ) -> Result<usize> {
        let mut evicted = 0usize;
        match count {
            Some(n) => {
                for _ in 0..n {
                    let Some(key) = self.ladder.peek_least().cloned() else {
                        break;
                    };
                    self.evict_one(&key, &mut on_evict)?;
                    evicted += 1;
                }
            }
            None => {
                let Some(first) = self.ladder.peek_least().cloned() else {
                    return Ok(0);
                };
                let rung = self
                    .ladder
                    .rung_of(&first)
                    .expect("peeked key is tracked");
                loop {
                    match self.ladder.peek_least().cloned() {
                        Some(key) if self.ladder.rung_of(&key) == Some(rung) => {
                            self.evict_one(&key, &mut on_evict)?;
                            evicted += 1;
                        }
                        _ => break,
                    }
                }
            }
        }
        Ok(evicted)
    }

    /// Removes a key, returning its value. No callback runs.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        let cost = self.cost_of(key, &value);
        self.ladder.remove(key);
        self.obsolete.remove(key);
        self.total_cost = self.total_cost.saturating_sub(cost);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.ladder.clear();
        self.obsolete.clear();
        self.total_cost = 0;
    }

    /// Drains every entry through `f`, leaving the cache empty. Entries
    /// come out in ladder order.
    pub fn drain_with(&mut self, mut f: impl FnMut(K, V) -> Result<()>) -> Result<()> {
        while let Some((key, value)) = self.pop_least() {
            f(key, value)?;
        }
        self.clear();
        Ok(())
    }

    // -- cost tracking -----------------------------------------------------

    /// Turns cost tracking on: every entry's cost comes from `cost_fn`, and
    /// inserts evict in ladder order while the total would exceed `budget`.
    ///
    /// Costs of already-resident entries are computed immediately; if they
    /// exceed the budget, eviction happens on the next insert, not here.
    pub fn track_cost(
        &mut self,
        budget: u64,
        cost_fn: impl Fn(&K, &V) -> u64 + Send + 'static,
    ) -> Result<()> {
        if budget == 0 {
            return Err(PagedError::InvalidConfig(
                "cost budget must be non-zero".to_string(),
            ));
        }
        let cost_fn: CostFn<K, V> = Box::new(cost_fn);
        self.total_cost = self.values.iter().map(|(k, v)| cost_fn(k, v)).sum();
        self.cost_fn = Some(cost_fn);
        self.budget = budget;
        Ok(())
    }

    /// Turns cost tracking off.
    pub fn stop_tracking_cost(&mut self) {
        self.budget = 0;
        self.total_cost = 0;
        self.cost_fn = None;
    }

    /// Current tracked total cost (0 when tracking is off).
    pub fn tracked_cost(&self) -> u64 {
        self.total_cost
    }

    pub fn cost_budget(&self) -> u64 {
        self.budget
    }

    // -- obsolescence ------------------------------------------------------

    /// Turns obsolescence tracking on: `clock` stamps every access, and a
    /// [`scan_for_obsolescence`](Self::scan_for_obsolescence) pass marks
    /// entries idle for more than `stale_after` ticks.
    pub fn start_tracking_obsolescence(
        &mut self,
        clock: impl Clock + Send + 'static,
        stale_after: u64,
    ) -> Result<()> {
        if stale_after == 0 {
            return Err(PagedError::InvalidConfig(
                "staleness window must be non-zero".to_string(),
            ));
        }
        // Pre-existing entries start the window from now, not from zero.
        let now = clock.ticks();
        for key in self.values.keys() {
            self.ladder.set_stamp(key, now);
        }
        self.clock = Some(Box::new(clock));
        self.stale_after = stale_after;
        Ok(())
    }

    /// Turns obsolescence tracking off and forgets all marks.
    pub fn stop_tracking_obsolescence(&mut self) {
        self.clock = None;
        self.stale_after = 0;
        self.obsolete.clear();
    }

    pub fn tracks_obsolescence(&self) -> bool {
        self.clock.is_some()
    }

    /// Number of entries currently marked obsolete.
    pub fn obsolete_len(&self) -> usize {
        self.obsolete.len()
    }

    /// Marks entries idle for longer than the staleness window, examining at
    /// most `budget` entries per call (hot rungs first). Returns the number
    /// newly marked. No-op unless tracking is on.
    pub fn scan_for_obsolescence(&mut self, budget: usize) -> usize {
        let Some(clock) = &self.clock else {
            return 0;
        };
        let now = clock.ticks();
        let mut stale = Vec::new();
        self.ladder
            .collect_stale(now, self.stale_after, budget, &mut stale);
        let mut marked = 0usize;
        for key in stale {
            if self.obsolete.insert(key) {
                marked += 1;
            }
        }
        marked
    }

    /// Unmarks everything and restarts every entry's idle window from now.
    pub fn reset_obsolescence(&mut self) {
        self.obsolete.clear();
        let now = self.now();
        if self.clock.is_some() {
            for key in self.values.keys() {
                self.ladder.set_stamp(key, now);
            }
        } else {
            self.ladder.reset_stamps();
        }
    }

    /// Evicts every marked-obsolete entry through `on_evict`. Returns the
    /// number evicted.
    pub fn remove_obsolete_items_with(
        &mut self,
        mut on_evict: impl FnMut(K, V) -> Result<()>,
    ) -> Result<usize> {
        let marked: Vec<K> = self.obsolete.iter().cloned().collect();
        let mut evicted = 0usize;
        for key in marked {
            self.evict_one(&key, &mut on_evict)?;
            evicted += 1;
        }
        Ok(evicted)
    }

    // -- iteration ---------------------------------------------------------

    /// Iterates entries in ladder order (next eviction victim first).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.ladder
            .iter()
            .filter_map(move |(k, _)| self.values.get(k).map(|v| (k, v)))
    }

    /// Iterates keys in ladder order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.ladder.iter().map(|(k, _)| k)
    }
}

impl<K, V> Default for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.values.len())
            .field("budget", &self.budget)
            .field("total_cost", &self.total_cost)
            .field("obsolete", &self.obsolete.len())
            .finish()
    }
}
