//! # Result Cache
//!
//! Bounded least-recently-used caches in front of the solve store.
//!
//! - `LruCache`: the generic cache. BTreeMap storage and a logical clock
//!   (monotonic counter) instead of wall time, so eviction order is
//!   deterministic.
//! - `ResultCache`: one point-lookup cache (solve id -> solve) and one
//!   query cache (normalized filter -> solves), each behind its own mutex.
//!
//! Absent results are never cached: a solve that does not exist yet must be
//! re-checked against the store every time.
//!
//! The query cache carries a generation that every invalidation bumps. A
//! result read from the store is only inserted if no invalidation happened
//! since the reader captured the generation.

use crate::primitives::{DEFAULT_QUERY_CACHE_CAPACITY, DEFAULT_SOLVE_CACHE_CAPACITY};
use crate::query::SolveFilter;
use crate::Solve;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

// =============================================================================
// CACHE ENTRY
// =============================================================================

/// An entry in the LRU cache.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    /// Logical timestamp of last access.
    last_access: u64,
}

// =============================================================================
// LRU CACHE
// =============================================================================

/// Fixed-capacity LRU cache.
#[derive(Debug)]
pub struct LruCache<K: Ord + Clone, V: Clone> {
    entries: BTreeMap<K, CacheEntry<V>>,
    max_size: usize,
    logical_clock: u64,
    hits: u64,
    misses: u64,
}

impl<K: Ord + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `max_size` entries (at least 1).
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_size: max_size.max(1),
            logical_clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.logical_clock = self.logical_clock.saturating_add(1);
        self.logical_clock
    }

    /// Get a value, marking it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let timestamp = self.tick();

        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = timestamp;
            self.hits = self.hits.saturating_add(1);
            Some(&entry.value)
        } else {
            self.misses = self.misses.saturating_add(1);
            None
        }
    }

    /// Get a value without touching its recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Insert or replace a value. Evicts the least recently used entry
    /// when a new key arrives at capacity.
    pub fn insert(&mut self, key: K, value: V) {
        let timestamp = self.tick();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.last_access = timestamp;
            return;
        }

        if self.entries.len() >= self.max_size {
            self.evict_one();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_access: timestamp,
            },
        );
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits.saturating_add(self.misses);
        let hit_rate_percent = if total == 0 {
            0
        } else {
            (self.hits.saturating_mul(100) / total) as u8
        };

        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            hit_rate_percent,
        }
    }

    fn evict_one(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

// =============================================================================
// CACHE STATISTICS
// =============================================================================

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as integer percentage (0-100).
    pub hit_rate_percent: u8,
}

// =============================================================================
// RESULT CACHE
// =============================================================================

/// Query results plus the invalidation generation they belong to.
#[derive(Debug)]
struct QueryCache {
    entries: LruCache<Vec<u8>, Vec<Solve>>,
    generation: u64,
}

/// Point and query caches for committed solves.
///
/// Construct one per service and pass it in; there is no global instance.
#[derive(Debug)]
pub struct ResultCache {
    solves: Mutex<LruCache<String, Solve>>,
    queries: Mutex<QueryCache>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVE_CACHE_CAPACITY, DEFAULT_QUERY_CACHE_CAPACITY)
    }
}

/// Recover the guard from a poisoned lock; cache contents stay usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResultCache {
    #[must_use]
    pub fn new(solve_capacity: usize, query_capacity: usize) -> Self {
        Self {
            solves: Mutex::new(LruCache::new(solve_capacity)),
            queries: Mutex::new(QueryCache {
                entries: LruCache::new(query_capacity),
                generation: 0,
            }),
        }
    }

    /// Cached solve by id.
    pub fn get_solve(&self, id: &str) -> Option<Solve> {
        lock(&self.solves).get(&id.to_string()).cloned()
    }

    /// Cache a solve under its id. Last write wins.
    pub fn insert_solve(&self, solve: Solve) {
        lock(&self.solves).insert(solve.id.clone(), solve);
    }

    /// Cached results for a normalized filter.
    ///
    /// A filter that cannot be encoded is treated as a miss.
    pub fn get_query(&self, filter: &SolveFilter) -> Option<Vec<Solve>> {
        let key = filter.cache_key().ok()?;
        lock(&self.queries).entries.get(&key).cloned()
    }

    /// Current invalidation generation. Capture it before reading the store.
    pub fn query_generation(&self) -> u64 {
        lock(&self.queries).generation
    }

    /// Cache results for a normalized filter, read while the cache was at
    /// `generation`.
    ///
    /// Returns `false` without inserting when the queries were invalidated
    /// in the meantime or the filter cannot be encoded.
    pub fn insert_query(&self, filter: &SolveFilter, results: Vec<Solve>, generation: u64) -> bool {
        let Ok(key) = filter.cache_key() else {
            return false;
        };
        let mut queries = lock(&self.queries);
        if queries.generation != generation {
            return false;
        }
        queries.entries.insert(key, results);
        true
    }

    /// Forget every cached query result (a new solve may match any of them).
    pub fn invalidate_queries(&self) {
        let mut queries = lock(&self.queries);
        queries.entries.clear();
        queries.generation = queries.generation.wrapping_add(1);
    }

    /// Statistics for both caches.
    pub fn stats(&self) -> ResultCacheStats {
        ResultCacheStats {
            solves: lock(&self.solves).stats(),
            queries: lock(&self.queries).entries.stats(),
        }
    }
}

/// Statistics for both caches of a `ResultCache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultCacheStats {
    pub solves: CacheStats,
    pub queries: CacheStats,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::SolveQuery;

    fn solve(id: &str, owner: &str) -> Solve {
        Solve {
            id: id.to_string(),
            owner_id: owner.to_string(),
            puzzle_id: "game-1".to_string(),
            hop_ids: vec!["hop1".to_string()],
            length: 0,
            associations_key: "assoc".to_string(),
            composite_key: format!("{owner}|game-1|hop1"),
            created_at: 0,
        }
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut cache: LruCache<u32, &str> = LruCache::new(2);
        cache.insert(1, "one");
        cache.insert(2, "two");

        // touch 1 so 2 becomes the eviction candidate
        assert_eq!(cache.get(&1), Some(&"one"));
        cache.insert(3, "three");

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&1).is_some());
        assert!(cache.peek(&2).is_none());
        assert!(cache.peek(&3).is_some());
    }

    #[test]
    fn lru_replace_does_not_evict() {
        let mut cache: LruCache<u32, u32> = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.insert(1, 11);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&1), Some(&11));
        assert_eq!(cache.peek(&2), Some(&20));
    }

    #[test]
    fn lru_zero_capacity_holds_one() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn lru_tracks_hits_and_misses() {
        let mut cache: LruCache<u32, u32> = LruCache::new(4);
        cache.insert(1, 1);
        let _ = cache.get(&1);
        let _ = cache.get(&2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate_percent, 50);
    }

    #[test]
    fn result_cache_point_lookup() {
        let cache = ResultCache::default();
        assert!(cache.get_solve("s1").is_none());

        cache.insert_solve(solve("s1", "you"));
        assert_eq!(cache.get_solve("s1").unwrap().owner_id, "you");
    }

    #[test]
    fn result_cache_query_roundtrip_and_invalidation() {
        let cache = ResultCache::new(10, 10);
        let filter = SolveQuery::by_owner("user-123").normalize();

        let generation = cache.query_generation();
        assert!(cache.insert_query(&filter, vec![solve("s1", "user-123")], generation));
        assert_eq!(cache.get_query(&filter).unwrap().len(), 1);

        cache.invalidate_queries();
        assert!(cache.get_query(&filter).is_none());
    }

    #[test]
    fn result_read_before_invalidation_is_not_cached() {
        let cache = ResultCache::new(10, 10);
        let filter = SolveQuery::by_owner("user-123").normalize();

        let generation = cache.query_generation();
        cache.invalidate_queries();

        assert!(!cache.insert_query(&filter, vec![solve("s1", "user-123")], generation));
        assert!(cache.get_query(&filter).is_none());

        let current = cache.query_generation();
        assert_ne!(current, generation);
        assert!(cache.insert_query(&filter, vec![solve("s1", "user-123")], current));
    }

    #[test]
    fn result_caches_are_independent() {
        let cache = ResultCache::new(10, 10);
        cache.insert_solve(solve("s1", "user-123"));

        let filter = SolveQuery::by_owner("user-123").normalize();
        assert!(cache.get_query(&filter).is_none());

        let stats = cache.stats();
        assert_eq!(stats.solves.size, 1);
        assert_eq!(stats.queries.size, 0);
    }
}
