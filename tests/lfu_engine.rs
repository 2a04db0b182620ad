//! Eviction-order and tracking invariants of the LFU engine.

use pagedvec::cache::LfuCache;
use pagedvec::traits::ManualClock;

#[test]
fn eviction_follows_ladder_order() {
    let mut cache = LfuCache::with_thresholds(&[1, 2, 3]).unwrap();
    cache.put("once", 1);
    cache.put("twice", 2);
    cache.put("thrice", 3);

    cache.try_get(&"twice");
    cache.try_get(&"thrice");
    cache.try_get(&"thrice");

    // once: count 1 (rung 0); twice: count 2 (rung 1); thrice: count 3
    // (rung 2). Pops come lowest rung first.
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("once"));
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("twice"));
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("thrice"));
    assert_eq!(cache.pop_least(), None);
}

#[test]
fn ties_within_a_rung_break_by_arrival() {
    let mut cache = LfuCache::with_thresholds(&[1, 2]).unwrap();
    for key in ["a", "b", "c"] {
        cache.put(key, ());
    }
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("a"));
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("b"));
    assert_eq!(cache.pop_least().map(|(k, _)| k), Some("c"));
}

#[test]
fn promotion_requires_strictly_exceeding_threshold() {
    let mut cache = LfuCache::with_thresholds(&[2, 5]).unwrap();
    cache.put("k", ());
    cache.try_get(&"k");
    // count == threshold: no promotion yet.
    assert_eq!(cache.frequency_of(&"k"), Some(2));

    let mut probe = LfuCache::with_thresholds(&[2, 5]).unwrap();
    probe.put("low", ());
    probe.put("k", ());
    probe.try_get(&"k");
    probe.try_get(&"k");
    // count 3 > 2: "k" left the bottom rung, so "low" pops first even
    // though it arrived earlier only by one slot.
    assert_eq!(probe.pop_least().map(|(k, _)| k), Some("low"));
}

#[test]
fn cost_budget_caps_total_and_tracks_removals() {
    let mut cache: LfuCache<u32, Vec<u8>> = LfuCache::new();
    cache.track_cost(10, |_, v| v.len() as u64).unwrap();

    cache.put_with(1, vec![0; 4], |_, _| Ok(())).unwrap();
    cache.put_with(2, vec![0; 4], |_, _| Ok(())).unwrap();
    assert_eq!(cache.tracked_cost(), 8);

    // 8 + 4 > 10: key 1 (lowest rung, oldest) is evicted.
    let mut evicted = Vec::new();
    cache
        .put_with(3, vec![0; 4], |k, _| {
            evicted.push(k);
            Ok(())
        })
        .unwrap();
    assert_eq!(evicted, vec![1]);
    assert_eq!(cache.tracked_cost(), 8);

    cache.remove(&2);
    assert_eq!(cache.tracked_cost(), 4);
}

#[test]
fn obsolescence_scan_marks_and_eviction_prefers_marked() {
    let clock = ManualClock::new();
    let mut cache = LfuCache::with_thresholds(&[1, 2, 3]).unwrap();
    cache
        .start_tracking_obsolescence(clock.clone(), 100)
        .unwrap();
    cache.track_cost(2, |_, _| 1).unwrap();

    cache.put_with(1u32, "hot", |_, _| Ok(())).unwrap();
    for _ in 0..10 {
        cache.try_get(&1);
    }
    cache.put_with(2u32, "cold", |_, _| Ok(())).unwrap();

    // The hot key goes idle past the window; the cold key stays fresh.
    clock.advance(200);
    cache.try_get(&2);
    assert_eq!(cache.scan_for_obsolescence(32), 1);

    let mut evicted = Vec::new();
    cache
        .put_with(3u32, "new", |k, _| {
            evicted.push(k);
            Ok(())
        })
        .unwrap();
    assert_eq!(evicted, vec![1], "stale hot key outranks fresh cold key");
}

#[test]
fn reset_obsolescence_restarts_idle_windows() {
    let clock = ManualClock::new();
    let mut cache = LfuCache::with_thresholds(&[1, 2]).unwrap();
    cache
        .start_tracking_obsolescence(clock.clone(), 50)
        .unwrap();
    cache.put("k", ());

    clock.advance(200);
    assert_eq!(cache.scan_for_obsolescence(16), 1);
    cache.reset_obsolescence();
    assert_eq!(cache.obsolete_len(), 0);
    assert_eq!(cache.scan_for_obsolescence(16), 0, "window restarted");
}

#[test]
fn drain_with_empties_in_ladder_order() {
    let mut cache = LfuCache::with_thresholds(&[1, 2]).unwrap();
    cache.put("a", 1);
    cache.put("b", 2);
    cache.try_get(&"b");

    let mut order = Vec::new();
    cache
        .drain_with(|k, _| {
            order.push(k);
            Ok(())
        })
        .unwrap();
    assert_eq!(order, vec!["a", "b"]);
    assert!(cache.is_empty());
}
