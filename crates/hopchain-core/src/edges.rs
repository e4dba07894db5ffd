//! # Open Edge Folding
//!
//! Computes which words of a puzzle are still open endpoints.
//!
//! The open edge sequence starts as the puzzle's starting words and is
//! folded over the accepted hops in the order the hops store returns them:
//!
//! - `from` not open: the hop is stale or malformed, skip it
//! - `from` and `to` both open: the hop closes a loop, drop every
//!   occurrence of both words
//! - only `from` open: the endpoint moved, replace the first `from` with `to`
//!
//! The fold is pure and cheap, so callers recompute it from the full hop
//! history on every request instead of caching it per attempt. Hops can be
//! appended out of band.

use crate::Hop;

/// Fold `hops` over `starting_words` and return the words still open.
///
/// Hops whose link key has no `::` separator are skipped.
#[must_use]
pub fn compute_open_edges(starting_words: &[String], hops: &[Hop]) -> Vec<String> {
    hops.iter()
        .fold(starting_words.to_vec(), |edges, hop| fold_hop(edges, hop))
}

/// Apply a single hop to the current open edge sequence.
fn fold_hop(mut edges: Vec<String>, hop: &Hop) -> Vec<String> {
    let Some((from, to)) = hop.canonical_pair() else {
        return edges;
    };

    let Some(from_index) = edges.iter().position(|w| w == from) else {
        return edges;
    };

    if edges.iter().any(|w| w == to) {
        edges.retain(|w| w != from && w != to);
    } else {
        edges[from_index] = to.to_string();
    }

    edges
}

/// True when folding `hops` leaves no open edge.
#[must_use]
pub fn is_complete(starting_words: &[String], hops: &[Hop]) -> bool {
    compute_open_edges(starting_words, hops).is_empty()
}

// =============================================================================
// TESTS
// =============================================================================
