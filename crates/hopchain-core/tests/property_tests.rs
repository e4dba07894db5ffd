//! # Property-Based Tests
//!
//! Determinism and fingerprint invariants of the solve engine.

use hopchain_core::{Hop, SolveQuery, compute_open_edges, composite_key, merge_associations};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Small alphabet so generated hops actually touch open words.
fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g", "h"]).prop_map(String::from)
}

fn hops() -> impl Strategy<Value = Vec<Hop>> {
    vec((word(), word()), 0..24).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (from, to))| Hop::new(format!("hop{i}"), &from, &to))
            .collect()
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Recomputing from the same history always gives the same edges.
    #[test]
    fn fold_is_deterministic(start in vec(word(), 2..6), history in hops()) {
        prop_assert_eq!(
            compute_open_edges(&start, &history),
            compute_open_edges(&start, &history)
        );
    }

    /// A hop never grows the open edge sequence.
    #[test]
    fn open_edges_never_grow(start in vec(word(), 2..6), history in hops()) {
        let mut previous = start.len();
        for n in 1..=history.len() {
            let edges = compute_open_edges(&start, &history[..n]);
            prop_assert!(edges.len() <= previous);
            previous = edges.len();
        }
    }

    /// Linking an open word to a new word keeps the length and writes the
    /// new word where the first occurrence of the open word was.
    #[test]
    fn substitution_preserves_length_and_position(
        start in vec(word(), 2..6),
        pick in any::<prop::sample::Index>(),
        fresh in "[i-z]{1,3}",
    ) {
        let from = start[pick.index(start.len())].clone();
        let first = start.iter().position(|w| *w == from).expect("picked from start");
        let edges = compute_open_edges(&start, &[Hop::new("hop0", &from, &fresh)]);

        prop_assert_eq!(edges.len(), start.len());
        prop_assert_eq!(&edges[first], &fresh);
        for (i, (before, after)) in start.iter().zip(&edges).enumerate() {
            if i != first {
                prop_assert_eq!(before, after);
            }
        }
    }

    /// Linking two distinct open words drops every occurrence of both.
    #[test]
    fn loop_closure_removes_both_words(
        start in vec(word(), 2..6),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let from = start[a.index(start.len())].clone();
        let to = start[b.index(start.len())].clone();
        prop_assume!(from != to);

        let count = |w: &String| start.iter().filter(|s| *s == w).count();
        let edges = compute_open_edges(&start, &[Hop::new("hop0", &from, &to)]);

        prop_assert_eq!(edges.len(), start.len() - (count(&from) + count(&to)));
        prop_assert!(!edges.contains(&from));
        prop_assert!(!edges.contains(&to));
    }

    /// Folding a prefix then the rest equals folding the whole history.
    #[test]
    fn fold_is_incremental(start in vec(word(), 2..6), history in hops(), split in 0usize..24) {
        let split = split.min(history.len());
        let midway = compute_open_edges(&start, &history[..split]);
        prop_assert_eq!(
            compute_open_edges(&midway, &history[split..]),
            compute_open_edges(&start, &history)
        );
    }

    /// Hops whose link key lacks the separator change nothing.
    #[test]
    fn malformed_hops_are_inert(start in vec(word(), 2..6), from in word(), to in word()) {
        let broken = Hop::new("hop0", &from, &to).with_link_key(format!("{from}{to}"));
        prop_assert_eq!(compute_open_edges(&start, &[broken]), start);
    }

    /// Any permutation of hop ids yields one composite key.
    #[test]
    fn composite_key_ignores_order(ids in vec("[a-z0-9]{1,8}", 1..10)) {
        let mut reversed = ids.clone();
        reversed.reverse();
        let mut sorted = ids.clone();
        sorted.sort();

        let key = composite_key("owner", "game", &ids);
        prop_assert_eq!(&key, &composite_key("owner", "game", &reversed));
        prop_assert_eq!(&key, &composite_key("owner", "game", &sorted));
    }

    /// Merged associations hold each non-empty token exactly once.
    #[test]
    fn merged_associations_are_unique(keys in vec("[a-c|]{0,8}", 0..6)) {
        let merged = merge_associations(keys.iter().map(String::as_str));
        let tokens: Vec<&str> = merged.split('|').filter(|t| !t.is_empty()).collect();
        let unique: BTreeSet<&str> = tokens.iter().copied().collect();

        prop_assert_eq!(tokens.len(), unique.len());
        for key in &keys {
            for token in key.split('|').filter(|t| !t.is_empty()) {
                prop_assert!(unique.contains(token));
            }
        }
    }

    /// Equal queries always produce equal cache keys.
    #[test]
    fn query_cache_key_is_stable(owner in "[a-z]{0,6}", assoc in proptest::option::of("[a-z]{1,6}")) {
        let q = SolveQuery {
            owner_id: Some(owner),
            puzzle_id: None,
            associations_key: assoc,
        };
        prop_assert_eq!(
            q.normalize().cache_key().expect("encode"),
            q.clone().normalize().cache_key().expect("encode")
        );
    }
}
