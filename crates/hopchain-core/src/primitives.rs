//! # Innate Primitives
//!
//! Hardcoded constants for the hopchain CORE.
//!
//! These values are part of the wire contract with the hops and solve
//! stores. Changing a separator changes every fingerprint ever written.

/// Separator inside a hop's canonical `linkKey` (`from::to`).
pub const LINK_KEY_SEPARATOR: &str = "::";

/// Separator between individual association tokens in an `associationsKey`.
pub const ASSOCIATIONS_SEPARATOR: char = '|';

/// Separator between the owner, puzzle and hop-list parts of a composite key.
pub const COMPOSITE_KEY_SEPARATOR: char = '|';

/// Separator between sorted hop ids inside a composite key.
pub const HOP_ID_SEPARATOR: char = ',';

/// A puzzle needs at least two starting words to form a chain.
pub const MIN_PUZZLE_WORDS: usize = 2;

/// Default capacity of the point-lookup (id -> solve) cache.
pub const DEFAULT_SOLVE_CACHE_CAPACITY: usize = 1000;

/// Default capacity of the filtered-query cache.
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a candidate word, in bytes.
///
/// Words longer than this are rejected before any collaborator is contacted.
pub const MAX_WORD_LENGTH: usize = 128;

/// Maximum number of records accepted by a single batch finalization.
pub const MAX_BATCH_SIZE: usize = 100;
