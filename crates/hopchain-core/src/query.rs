//! # Solve Queries
//!
//! A `SolveQuery` is what callers send; a `SolveFilter` is what the stores
//! and the query cache see. Normalization keeps only:
//! - `ownerId` and `puzzleId` (alias `gameId`) as equality filters
//! - `associationsKey` as a substring filter
//!
//! Everything else a caller sends is dropped, so two requests that differ
//! only in ignored fields share one cache entry.

use crate::{ChainError, Solve};
use serde::{Deserialize, Serialize};

/// Incoming solve query. Unknown fields are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveQuery {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default, alias = "gameId")]
    pub puzzle_id: Option<String>,
    #[serde(default)]
    pub associations_key: Option<String>,
}

impl SolveQuery {
    /// Query for every solve of one owner.
    #[must_use]
    pub fn by_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    /// Normalize into a filter.
    #[must_use]
    pub fn normalize(&self) -> SolveFilter {
        SolveFilter {
            owner_eq: self.owner_id.clone(),
            puzzle_eq: self.puzzle_id.clone(),
            associations_contains: self.associations_key.clone(),
        }
    }
}

/// Normalized filter over committed solves.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SolveFilter {
    pub owner_eq: Option<String>,
    pub puzzle_eq: Option<String>,
    pub associations_contains: Option<String>,
}

impl SolveFilter {
    /// True when `solve` satisfies every present condition.
    #[must_use]
    pub fn matches(&self, solve: &Solve) -> bool {
        self.owner_eq.as_deref().is_none_or(|o| solve.owner_id == o)
            && self.puzzle_eq.as_deref().is_none_or(|p| solve.puzzle_id == p)
            && self
                .associations_contains
                .as_deref()
                .is_none_or(|a| solve.associations_key.contains(a))
    }

    /// Deterministic binary cache key for this filter.
    pub fn cache_key(&self) -> Result<Vec<u8>, ChainError> {
        postcard::to_allocvec(self).map_err(|e| ChainError::SerializationError(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn solve(owner: &str, puzzle: &str, assoc: &str) -> Solve {
        Solve {
            id: format!("{owner}-{puzzle}"),
            owner_id: owner.to_string(),
            puzzle_id: puzzle.to_string(),
            hop_ids: vec!["h1".to_string()],
            length: 0,
            associations_key: assoc.to_string(),
            composite_key: format!("{owner}|{puzzle}|h1"),
            created_at: 0,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SolveQuery::default().normalize();
        assert!(filter.matches(&solve("a", "p", "")));
    }

    #[test]
    fn equality_and_contains_conditions() {
        let filter = SolveQuery {
            owner_id: Some("user-123".to_string()),
            puzzle_id: None,
            associations_key: Some("rhyme".to_string()),
        }
        .normalize();

        assert!(filter.matches(&solve("user-123", "p1", "synonym|rhyme")));
        assert!(!filter.matches(&solve("user-123", "p1", "synonym")));
        assert!(!filter.matches(&solve("user-999", "p1", "rhyme")));
    }

    #[test]
    fn equality_is_exact_not_prefix() {
        let filter = SolveQuery::by_owner("user").normalize();
        assert!(!filter.matches(&solve("user-123", "p", "")));
    }

    #[test]
    fn identical_filters_share_cache_key() {
        let a = SolveQuery::by_owner("user-123").normalize();
        let b = SolveQuery::by_owner("user-123").normalize();
        let c = SolveQuery::by_owner("user-456").normalize();

        assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
        assert_ne!(a.cache_key().unwrap(), c.cache_key().unwrap());
    }

    #[test]
    fn eq_and_contains_slots_do_not_collide() {
        let owner = SolveQuery::by_owner("x").normalize();
        let assoc = SolveQuery {
            associations_key: Some("x".to_string()),
            ..SolveQuery::default()
        }
        .normalize();

        assert_ne!(owner.cache_key().unwrap(), assoc.cache_key().unwrap());
    }
}
