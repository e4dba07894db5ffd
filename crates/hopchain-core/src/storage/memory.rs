//! In-memory solve store.

use super::SolveStore;
use crate::query::SolveFilter;
use crate::{ChainError, Solve};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct Inner {
    solves: BTreeMap<String, Solve>,
    /// composite key -> solve id
    composite_index: BTreeMap<String, String>,
}

/// Volatile solve store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySolveStore {
    inner: RwLock<Inner>,
}

impl MemorySolveStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolveStore for MemorySolveStore {
    fn get(&self, id: &str) -> Result<Option<Solve>, ChainError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.solves.get(id).cloned())
    }

    fn find_by_composite_key(&self, composite_key: &str) -> Result<Option<Solve>, ChainError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .composite_index
            .get(composite_key)
            .and_then(|id| inner.solves.get(id))
            .cloned())
    }

    fn create(&self, solve: &Solve) -> Result<(), ChainError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.solves.contains_key(&solve.id) {
            return Err(ChainError::Conflict(format!(
                "solve '{}' already exists",
                solve.id
            )));
        }
        if inner.composite_index.contains_key(&solve.composite_key) {
            return Err(ChainError::Conflict(format!(
                "composite key '{}' already recorded",
                solve.composite_key
            )));
        }

        inner
            .composite_index
            .insert(solve.composite_key.clone(), solve.id.clone());
        inner.solves.insert(solve.id.clone(), solve.clone());
        Ok(())
    }

    fn query(&self, filter: &SolveFilter) -> Result<Vec<Solve>, ChainError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .solves
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, ChainError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.solves.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
