//! Bounded result cache for decision-tree lookups.
//!
//! ## Layout
//!
//! ```text
//! fingerprint & (N - 1) ──► primary slot
//!                             │
//!                 ┌───────────┴───────────┐
//!   window:  [primary] [+1] [+2] [+3]      (wraps at N)
//! ```
//!
//! Lookup and insert only ever touch the 4-slot window, so both are O(1)
//! regardless of load. Eviction picks the least recently used entry *of the
//! window*, not of the table: an approximate LRU with a hard latency bound.
//!
//! A miss is always safe (the caller walks the tree), so nothing here returns
//! an error after [`DtCache::initialize`]. Disabling the cache turns every
//! lookup into a miss and every insert into a no-op without discarding
//! entries or statistics.

pub mod fingerprint;
pub mod handle;

pub use fingerprint::{context_fingerprint, extended_fingerprint, PhonemeContext};
pub use handle::SharedDtCache;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::error::{try_alloc, Result};

/// Slots examined per lookup/insert, including the primary slot.
pub const PROBE_WINDOW: usize = 4;

/// Capacity used on memory-constrained targets.
pub const EMBEDDED_CAPACITY: usize = 128;
/// Capacity used on desktop/server targets.
pub const DESKTOP_CAPACITY: usize = 256;

pub type EmbeddedDtCache = DtCache<EMBEDDED_CAPACITY>;
pub type DesktopDtCache = DtCache<DESKTOP_CAPACITY>;

/// One cached `(fingerprint, tree) → result` mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: u32,
    pub tree_id: u16,
    pub result: u16,
    pub valid: bool,
    /// Clock value at last touch. Relative ordering only; the clock wraps.
    pub recency: u8,
}

impl CacheEntry {
    fn matches(&self, fingerprint: u32, tree_id: u16) -> bool {
        self.valid && self.fingerprint == fingerprint && self.tree_id == tree_id
    }
}

/// Running counters, copied out by [`DtCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    /// Hits found outside the primary slot.
    pub collisions: u32,
    /// Valid entries overwritten by an insert.
    pub evictions: u32,
}

impl CacheStats {
    /// `hits * 100 / (hits + misses)`, truncated; 0 before any lookup.
    pub fn hit_rate(&self) -> u8 {
        let total = self.hits as u64 + self.misses as u64;
        if total == 0 {
            return 0;
        }
        (self.hits as u64 * 100 / total) as u8
    }
}

/// Fixed-capacity decision-tree result cache. `N` must be a power of two and
/// at least [`PROBE_WINDOW`].
#[derive(Debug)]
pub struct DtCache<const N: usize = DESKTOP_CAPACITY> {
    entries: Box<[CacheEntry]>,
    stats: CacheStats,
    enabled: bool,
    clock: u8,
}

impl<const N: usize> DtCache<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "cache capacity must be a power of two");
        assert!(N >= PROBE_WINDOW, "cache capacity must cover the probe window");
        N - 1
    };

    /// Allocate the entry table. All entries start invalid, statistics and
    /// clock at zero, cache enabled.
    ///
    /// # Errors
    /// `AccelError::OutOfMemory` if the table cannot be allocated.
    pub fn initialize() -> Result<Self> {
        let _ = Self::MASK;
        let entries = try_alloc(N, CacheEntry::default(), "decision-tree cache")?;
        info!(
            capacity = N,
            bytes = N * std::mem::size_of::<CacheEntry>(),
            "decision-tree cache initialized"
        );
        Ok(Self {
            entries: entries.into_boxed_slice(),
            stats: CacheStats::default(),
            enabled: true,
            clock: 0,
        })
    }

    /// Invalidate every entry and zero statistics and clock. Keeps the
    /// allocation and the enabled flag.
    pub fn clear(&mut self) {
        for e in self.entries.iter_mut() {
            e.valid = false;
            e.recency = 0;
        }
        self.stats = CacheStats::default();
        self.clock = 0;
        debug!(capacity = N, "decision-tree cache cleared");
    }

    /// Look up the result cached for `(fingerprint, tree_id)`.
    pub fn lookup(&mut self, fingerprint: u32, tree_id: u16) -> Option<u16> {
        if !self.enabled {
            return None;
        }

        let primary = Self::primary_index(fingerprint);
        for offset in 0..PROBE_WINDOW {
            let idx = (primary + offset) & Self::MASK;
            if self.entries[idx].matches(fingerprint, tree_id) {
                let stamp = self.tick();
                let entry = &mut self.entries[idx];
                entry.recency = stamp;
                self.stats.hits = self.stats.hits.wrapping_add(1);
                if offset != 0 {
                    self.stats.collisions = self.stats.collisions.wrapping_add(1);
                }
                return Some(entry.result);
            }
        }

        self.stats.misses = self.stats.misses.wrapping_add(1);
        None
    }

    /// Cache `result` for `(fingerprint, tree_id)`.
    ///
    /// Placement order: an existing entry for the same key is refreshed in
    /// place; else an empty primary slot; else the first empty slot in the
    /// window; else the window's least recently used entry is evicted.
    pub fn insert(&mut self, fingerprint: u32, tree_id: u16, result: u16) {
        if !self.enabled {
            return;
        }

        let primary = Self::primary_index(fingerprint);
        let idx = match self.find_in_window(primary, fingerprint, tree_id) {
            Some(existing) => existing,
            None if !self.entries[primary].valid => primary,
            None => {
                let victim = self.find_victim(primary);
                if self.entries[victim].valid {
                    self.stats.evictions = self.stats.evictions.wrapping_add(1);
                    trace!(
                        slot = victim,
                        evicted = self.entries[victim].fingerprint,
                        "decision-tree cache eviction"
                    );
                }
                victim
            }
        };

        let stamp = self.tick();
        self.entries[idx] = CacheEntry {
            fingerprint,
            tree_id,
            result,
            valid: true,
            recency: stamp,
        };
    }

    /// Return the cached result, or run `compute`, cache its value and return it.
    pub fn get_or_insert_with<F>(&mut self, fingerprint: u32, tree_id: u16, compute: F) -> u16
    where
        F: FnOnce() -> u16,
    {
        if let Some(hit) = self.lookup(fingerprint, tree_id) {
            return hit;
        }
        let result = compute();
        self.insert(fingerprint, tree_id, result);
        result
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn hit_rate(&self) -> u8 {
        self.stats.hit_rate()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "decision-tree cache toggled");
        }
        self.enabled = enabled;
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|e| e.valid)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn primary_index(fingerprint: u32) -> usize {
        fingerprint as usize & Self::MASK
    }

    /// Current clock value, then advance (wrapping).
    fn tick(&mut self) -> u8 {
        let stamp = self.clock;
        self.clock = self.clock.wrapping_add(1);
        stamp
    }

    fn find_in_window(&self, primary: usize, fingerprint: u32, tree_id: u16) -> Option<usize> {
        (0..PROBE_WINDOW)
            .map(|offset| (primary + offset) & Self::MASK)
            .find(|&idx| self.entries[idx].matches(fingerprint, tree_id))
    }

    /// First empty slot in the window, otherwise the smallest recency marker
    /// (earliest slot on ties).
    fn find_victim(&self, primary: usize) -> usize {
        let mut lru = primary;
        let mut min_recency = u8::MAX;
        for offset in 0..PROBE_WINDOW {
            let idx = (primary + offset) & Self::MASK;
            let entry = &self.entries[idx];
            if !entry.valid {
                return idx;
            }
            if entry.recency < min_recency {
                min_recency = entry.recency;
                lru = idx;
            }
        }
        lru
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type SmallCache = DtCache<16>;

    /// Fingerprints that all land on primary slot `slot` of a 16-entry table.
    fn colliding(slot: u32, count: u32) -> Vec<u32> {
        (0..count).map(|i| slot | ((i + 1) << 8)).collect()
    }

    #[test]
    fn fresh_cache_is_empty_and_enabled() {
        let cache = SmallCache::initialize().unwrap();
        assert!(cache.is_enabled());
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 16);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn insert_then_lookup_hits() {
        let mut cache = SmallCache::initialize().unwrap();
        cache.insert(0xABCD_1234, 3, 42);
        assert_eq!(cache.lookup(0xABCD_1234, 3), Some(42));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().collisions, 0);
    }

    #[test]
    fn tree_id_is_part_of_the_key() {
        let mut cache = SmallCache::initialize().unwrap();
        cache.insert(7, 1, 100);
        assert_eq!(cache.lookup(7, 2), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn colliding_keys_fill_the_window_and_count_collisions() {
        let mut cache = SmallCache::initialize().unwrap();
        let keys = colliding(5, 4);
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, 0, i as u16);
        }
        assert_eq!(cache.stats().evictions, 0);
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(cache.lookup(k, 0), Some(i as u16));
        }
        let stats = cache.stats();
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.collisions, 3);
    }

    #[test]
    fn window_wraps_at_table_end() {
        let mut cache = SmallCache::initialize().unwrap();
        let keys = colliding(15, 4);
        for &k in &keys {
            cache.insert(k, 0, 1);
        }
        // slots 15, 0, 1, 2
        assert!(cache.entries[15].valid);
        assert!(cache.entries[0].valid && cache.entries[1].valid && cache.entries[2].valid);
        assert!(keys.iter().all(|&k| cache.lookup(k, 0) == Some(1)));
    }

    #[test]
    fn fifth_colliding_insert_evicts_least_recent() {
        let mut cache = SmallCache::initialize().unwrap();
        let keys = colliding(3, 5);
        for &k in &keys[..4] {
            cache.insert(k, 0, 9);
        }
        // touch everything but keys[1] so it becomes the LRU
        cache.lookup(keys[0], 0);
        cache.lookup(keys[2], 0);
        cache.lookup(keys[3], 0);

        cache.insert(keys[4], 0, 10);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.lookup(keys[1], 0), None);
        assert_eq!(cache.lookup(keys[4], 0), Some(10));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn free_slot_in_window_is_used_before_evicting() {
        let mut cache = SmallCache::initialize().unwrap();
        // occupy primary 2 and slot 4 (primary of another key); slot 3 free
        cache.insert(2, 0, 1);
        cache.insert(4, 0, 1);
        cache.insert(2 | 0x100, 0, 2);
        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.entries[3].valid);
        assert_eq!(cache.entries[3].fingerprint, 2 | 0x100);
    }

    #[test]
    fn reinsert_refreshes_instead_of_duplicating() {
        let mut cache = SmallCache::initialize().unwrap();
        let keys = colliding(8, 2);
        cache.insert(keys[0], 0, 1);
        cache.insert(keys[1], 0, 2);
        cache.insert(keys[1], 0, 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(keys[1], 0), Some(3));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn hit_rate_arithmetic() {
        let mut cache = SmallCache::initialize().unwrap();
        assert_eq!(cache.hit_rate(), 0);
        cache.insert(1, 0, 1);
        for _ in 0..3 {
            cache.lookup(1, 0);
        }
        cache.lookup(2, 0);
        assert_eq!(cache.hit_rate(), 75);
    }

    #[test]
    fn hit_rate_survives_large_counters() {
        let stats = CacheStats {
            hits: u32::MAX,
            misses: 0,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 100);
    }

    #[test]
    fn disabled_cache_is_inert() {
        let mut cache = SmallCache::initialize().unwrap();
        cache.insert(1, 0, 5);
        let before = cache.stats();
        cache.set_enabled(false);

        assert_eq!(cache.lookup(1, 0), None);
        cache.insert(2, 0, 6);
        assert_eq!(cache.stats(), before);
        assert_eq!(cache.len(), 1);

        cache.set_enabled(true);
        assert_eq!(cache.lookup(1, 0), Some(5));
        assert_eq!(cache.lookup(2, 0), None);
    }

    #[test]
    fn clear_resets_everything_but_enabled() {
        let mut cache = SmallCache::initialize().unwrap();
        cache.insert(1, 0, 5);
        cache.lookup(1, 0);
        cache.lookup(9, 0);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.clock, 0);
        assert!(cache.is_enabled());
        assert_eq!(cache.lookup(1, 0), None);
    }

    #[test]
    fn clock_wraps_without_panicking() {
        let mut cache = SmallCache::initialize().unwrap();
        cache.insert(1, 0, 1);
        for _ in 0..600 {
            assert_eq!(cache.lookup(1, 0), Some(1));
        }
        assert_eq!(cache.clock, (601 % 256) as u8);
    }

    #[test]
    fn get_or_insert_with_computes_once() {
        let mut cache = SmallCache::initialize().unwrap();
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_insert_with(77, 4, || {
                calls += 1;
                123
            });
            assert_eq!(v, 123);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
    }
}
