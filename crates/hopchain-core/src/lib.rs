//! # hopchain-core
//!
//! The deterministic solve engine for hopchain.
//!
//! A puzzle is a set of starting words. Players link words with hops; each
//! accepted hop moves or closes an open edge. When no edge is left open the
//! attempt becomes a solve, fingerprinted by an order-independent composite
//! key so the same path is never recorded twice.
//!
//! ## Layout
//!
//! - `types`: records exchanged with collaborators and callers
//! - `edges`: the open edge fold and the completion check
//! - `fingerprint`: composite keys, association merging, solve drafts
//! - `query`: solve query normalization
//! - `cache`: bounded LRU result caches
//! - `storage`: the `SolveStore` trait with memory and redb backends
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - BTreeMap only, no floats, no randomness
//! - Open edges are never cached; they are recomputed from hop history

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod edges;
pub mod fingerprint;
pub mod primitives;
pub mod query;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AttemptContext, AttemptIds, AttemptOutcome, AttemptState, ChainError, Hop, Puzzle, Solve,
};

// =============================================================================
// RE-EXPORTS: Solve Engine
// =============================================================================

pub use cache::{CacheStats, LruCache, ResultCache, ResultCacheStats};
pub use edges::{compute_open_edges, is_complete};
pub use fingerprint::{SolveDraft, composite_key, merge_associations, merged_associations};
pub use query::{SolveFilter, SolveQuery};
pub use storage::{MemorySolveStore, RedbSolveStore, SolveStore};
