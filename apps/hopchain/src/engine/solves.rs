//! Solve store plus result caches.

use hopchain_core::{ChainError, ResultCache, ResultCacheStats, Solve, SolveQuery, SolveStore};
use std::sync::Arc;

/// Committed solves with a cache in front.
///
/// Reads by id and by query go through the cache. The duplicate check
/// (`find_by_composite_key`) always hits the store.
pub struct SolveBook {
    store: Arc<dyn SolveStore>,
    cache: ResultCache,
}

impl std::fmt::Debug for SolveBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolveBook")
            .field("backend", &self.store.backend_name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl SolveBook {
    pub fn new(store: Arc<dyn SolveStore>, cache: ResultCache) -> Self {
        Self { store, cache }
    }

    pub fn get(&self, id: &str) -> Result<Option<Solve>, ChainError> {
        if let Some(hit) = self.cache.get_solve(id) {
            return Ok(Some(hit));
        }

        let found = self.store.get(id)?;
        if let Some(solve) = &found {
            self.cache.insert_solve(solve.clone());
        }
        Ok(found)
    }

    /// Empty result sets are not cached, nor are results that a commit
    /// overtook while the store was being read.
    pub fn query(&self, query: &SolveQuery) -> Result<Vec<Solve>, ChainError> {
        let filter = query.normalize();
        if let Some(hit) = self.cache.get_query(&filter) {
            return Ok(hit);
        }

        let generation = self.cache.query_generation();
        let results = self.store.query(&filter)?;
        if !results.is_empty() {
            self.cache.insert_query(&filter, results.clone(), generation);
        }
        Ok(results)
    }

    pub fn find_by_composite_key(&self, composite_key: &str) -> Result<Option<Solve>, ChainError> {
        self.store.find_by_composite_key(composite_key)
    }

    /// Store a new solve, then refresh the caches.
    pub fn commit(&self, solve: &Solve) -> Result<(), ChainError> {
        self.store.create(solve)?;
        self.cache.insert_solve(solve.clone());
        self.cache.invalidate_queries();
        Ok(())
    }

    pub fn count(&self) -> Result<usize, ChainError> {
        self.store.count()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn cache_stats(&self) -> ResultCacheStats {
        self.cache.stats()
    }
}
