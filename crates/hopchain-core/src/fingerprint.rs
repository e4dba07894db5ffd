//! # Path Fingerprints
//!
//! Everything needed to turn a folded hop history into a record:
//! - `composite_key`: order-independent fingerprint of (owner, puzzle, hop set)
//! - `merge_associations`: order-preserving union of association tokens
//! - `SolveDraft`: a solve that has not been committed yet
//! - `AttemptState::from_hops`: the transient view of an unfinished attempt

use crate::primitives::{ASSOCIATIONS_SEPARATOR, COMPOSITE_KEY_SEPARATOR, HOP_ID_SEPARATOR};
use crate::{AttemptIds, AttemptState, Hop, Solve};
use std::collections::BTreeSet;

// =============================================================================
// COMPOSITE KEY
// =============================================================================

/// Build `ownerId|puzzleId|h1,h2,...` with hop ids sorted lexically.
///
/// Any permutation of the same hop ids yields the same key.
#[must_use]
pub fn composite_key<S: AsRef<str>>(owner_id: &str, puzzle_id: &str, hop_ids: &[S]) -> String {
    let mut sorted: Vec<&str> = hop_ids.iter().map(|id| id.as_ref()).collect();
    sorted.sort_unstable();

    let mut key = String::with_capacity(
        owner_id.len() + puzzle_id.len() + sorted.iter().map(|id| id.len() + 1).sum::<usize>() + 2,
    );
    key.push_str(owner_id);
    key.push(COMPOSITE_KEY_SEPARATOR);
    key.push_str(puzzle_id);
    key.push(COMPOSITE_KEY_SEPARATOR);
    for (i, id) in sorted.iter().enumerate() {
        if i > 0 {
            key.push(HOP_ID_SEPARATOR);
        }
        key.push_str(id);
    }
    key
}

// =============================================================================
// ASSOCIATIONS
// =============================================================================

/// Merge multi-valued association keys into one `|`-delimited key.
///
/// Tokens keep the order in which they were first seen; repeats and empty
/// tokens are dropped.
#[must_use]
pub fn merge_associations<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = BTreeSet::new();
    let mut merged: Vec<&str> = Vec::new();

    for token in keys
        .into_iter()
        .flat_map(|key| key.split(ASSOCIATIONS_SEPARATOR))
    {
        if !token.is_empty() && seen.insert(token) {
            merged.push(token);
        }
    }

    let mut out = String::new();
    for (i, token) in merged.iter().enumerate() {
        if i > 0 {
            out.push(ASSOCIATIONS_SEPARATOR);
        }
        out.push_str(token);
    }
    out
}

/// Merge the association keys of `hops`, in hop order.
#[must_use]
pub fn merged_associations(hops: &[Hop]) -> String {
    merge_associations(hops.iter().map(|h| h.associations_key.as_str()))
}

// =============================================================================
// SOLVE DRAFT
// =============================================================================

/// A solve computed from a completed hop history but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveDraft {
    pub ids: AttemptIds,
    /// Hop ids in merge order.
    pub hop_ids: Vec<String>,
    pub associations_key: String,
    pub composite_key: String,
}

impl SolveDraft {
    /// Derive the draft for `hops`, which must already be in merge order.
    #[must_use]
    pub fn from_hops(ids: &AttemptIds, hops: &[Hop]) -> Self {
        let hop_ids: Vec<String> = hops.iter().map(|h| h.id.clone()).collect();
        let composite_key = composite_key(&ids.owner_id, &ids.puzzle_id, &hop_ids);

        Self {
            ids: ids.clone(),
            hop_ids,
            associations_key: merged_associations(hops),
            composite_key,
        }
    }

    /// Path length: hop count minus one.
    #[must_use]
    pub fn length(&self) -> usize {
        self.hop_ids.len().saturating_sub(1)
    }

    /// Stamp the draft into a committed solve record.
    #[must_use]
    pub fn into_solve(self, created_at: u64) -> Solve {
        let length = self.length();
        Solve {
            id: self.ids.attempt_id,
            owner_id: self.ids.owner_id,
            puzzle_id: self.ids.puzzle_id,
            hop_ids: self.hop_ids,
            length,
            associations_key: self.associations_key,
            composite_key: self.composite_key,
            created_at,
        }
    }
}

// =============================================================================
// PENDING STATE
// =============================================================================

impl AttemptState {
    /// Describe an unfinished attempt. `now` is unix epoch milliseconds.
    #[must_use]
    pub fn from_hops(ids: &AttemptIds, hops: &[Hop], open_edges: Vec<String>, now: u64) -> Self {
        Self {
            id: ids.attempt_id.clone(),
            owner_id: ids.owner_id.clone(),
            puzzle_id: ids.puzzle_id.clone(),
            hop_ids: hops.iter().map(|h| h.id.clone()).collect(),
            associations_key: merged_associations(hops),
            open_edges,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> AttemptIds {
        AttemptIds {
            owner_id: "owner123".to_string(),
            puzzle_id: "game456".to_string(),
            attempt_id: "attempt789".to_string(),
        }
    }

    #[test]
    fn composite_key_sorts_hop_ids() {
        assert_eq!(
            composite_key("owner", "game", &["hop3", "hop1", "hop2"]),
            "owner|game|hop1,hop2,hop3"
        );
    }

    #[test]
    fn composite_key_is_order_independent() {
        let a = composite_key("o", "g", &["b", "a", "c"]);
        let b = composite_key("o", "g", &["c", "b", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn composite_key_single_hop() {
        assert_eq!(composite_key("owner123", "game456", &["hop1"]), "owner123|game456|hop1");
    }

    #[test]
    fn merge_dedupes_preserving_first_appearance() {
        assert_eq!(merge_associations(["key1|key2", "key2|key3"]), "key1|key2|key3");
    }

    #[test]
    fn merge_drops_empty_tokens() {
        assert_eq!(merge_associations(["", "a||b", "|a"]), "a|b");
        assert_eq!(merge_associations(std::iter::empty()), "");
    }

    #[test]
    fn draft_keeps_merge_order_but_sorts_fingerprint() {
        let hops = vec![
            Hop::new("hop2", "start", "middle").with_associations("assoc2"),
            Hop::new("hop1", "middle", "end").with_associations("assoc1|assoc2"),
        ];

        let draft = SolveDraft::from_hops(&ids(), &hops);
        assert_eq!(draft.hop_ids, vec!["hop2", "hop1"]);
        assert_eq!(draft.composite_key, "owner123|game456|hop1,hop2");
        assert_eq!(draft.associations_key, "assoc2|assoc1");
        assert_eq!(draft.length(), 1);

        let solve = draft.into_solve(42);
        assert_eq!(solve.id, "attempt789");
        assert_eq!(solve.length, 1);
        assert_eq!(solve.created_at, 42);
    }

    #[test]
    fn single_hop_solve_has_zero_length() {
        let hops = vec![Hop::new("hop1", "start", "end")];
        assert_eq!(SolveDraft::from_hops(&ids(), &hops).length(), 0);
    }

    #[test]
    fn pending_state_carries_merged_view() {
        let hops = vec![
            Hop::new("hop1", "start", "middle").with_associations("assoc1"),
            Hop::new("hop2", "middle", "destination").with_associations("assoc2"),
        ];
        let state =
            AttemptState::from_hops(&ids(), &hops, vec!["destination".to_string(), "end".to_string()], 7);

        assert_eq!(state.id, "attempt789");
        assert_eq!(state.hop_ids, vec!["hop1", "hop2"]);
        assert_eq!(state.associations_key, "assoc1|assoc2");
        assert_eq!(state.open_edges.len(), 2);
        assert_eq!(state.updated_at, 7);
    }
}
