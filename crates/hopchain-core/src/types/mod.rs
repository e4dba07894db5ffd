//! # Core Type Definitions
//!
//! This module contains the types shared by every layer of hopchain:
//! - Puzzle definitions and accepted hops (`Puzzle`, `Hop`)
//! - Attempt identity (`AttemptContext`, `AttemptIds`)
//! - The transient/durable result split (`AttemptState`, `Solve`, `AttemptOutcome`)
//! - Error types (`ChainError`)
//!
//! All identifiers are opaque strings handed out by the collaborating
//! services. JSON field names follow the collaborators' camelCase wire format.

use crate::primitives::{LINK_KEY_SEPARATOR, MIN_PUZZLE_WORDS};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// PUZZLE
// =============================================================================

/// A puzzle ("game") as served by the games collaborator.
///
/// Immutable once created. The order of `words` is significant: open edges
/// start out in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub words: Vec<String>,
}

impl Puzzle {
    /// Create a new puzzle.
    #[must_use]
    pub fn new(id: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            id: id.into(),
            words,
        }
    }

    /// Reject puzzles that cannot form a chain.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.words.len() < MIN_PUZZLE_WORDS {
            return Err(ChainError::InvalidPuzzle(format!(
                "puzzle {} has {} starting words, need at least {}",
                self.id,
                self.words.len(),
                MIN_PUZZLE_WORDS
            )));
        }
        Ok(())
    }
}

// =============================================================================
// HOP
// =============================================================================

/// An accepted link between two words inside one attempt.
///
/// `from`/`to` are whatever the player submitted and may point backwards.
/// `link_key` holds the canonical `from::to` pair fixed by the hops service
/// and is the only direction the edge folding trusts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub associations_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Hop {
    /// Create a hop whose reported direction matches its canonical link key.
    #[must_use]
    pub fn new(id: impl Into<String>, from: &str, to: &str) -> Self {
        Self {
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
            link_key: format!("{}{}{}", from, LINK_KEY_SEPARATOR, to),
            associations_key: String::new(),
            created_at: None,
        }
    }

    /// Set the associations key.
    #[must_use]
    pub fn with_associations(mut self, associations_key: impl Into<String>) -> Self {
        self.associations_key = associations_key.into();
        self
    }

    /// Override the canonical link key (e.g. a hop traversed backwards).
    #[must_use]
    pub fn with_link_key(mut self, link_key: impl Into<String>) -> Self {
        self.link_key = link_key.into();
        self
    }

    /// The canonical `(from, to)` pair parsed from the link key.
    ///
    /// Returns `None` when the key has no separator.
    #[must_use]
    pub fn canonical_pair(&self) -> Option<(&str, &str)> {
        self.link_key.split_once(LINK_KEY_SEPARATOR)
    }
}

// =============================================================================
// ATTEMPT IDENTITY
// =============================================================================

/// Identifiers supplied by the caller for one hop attempt.
///
/// Every field is optional on the wire; `resolve` turns the context into
/// validated `AttemptIds` or fails with `ChainError::MissingContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptContext {
    pub owner_id: Option<String>,
    pub puzzle_id: Option<String>,
    pub attempt_id: Option<String>,
}

impl AttemptContext {
    /// Build a fully populated context.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        puzzle_id: impl Into<String>,
        attempt_id: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            puzzle_id: Some(puzzle_id.into()),
            attempt_id: Some(attempt_id.into()),
        }
    }

    /// Validate that all three identifiers are present and non-blank.
    ///
    /// Accepted identifiers are returned verbatim, surrounding whitespace
    /// included, so they keep matching what the collaborators store.
    pub fn resolve(&self) -> Result<AttemptIds, ChainError> {
        fn present(value: Option<&String>, name: &str) -> Result<String, ChainError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(ChainError::MissingContext(name.to_string())),
            }
        }

        Ok(AttemptIds {
            owner_id: present(self.owner_id.as_ref(), "ownerId")?,
            puzzle_id: present(self.puzzle_id.as_ref(), "puzzleId")?,
            attempt_id: present(self.attempt_id.as_ref(), "attemptId")?,
        })
    }
}

/// Validated identifiers of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptIds {
    pub owner_id: String,
    pub puzzle_id: String,
    pub attempt_id: String,
}

// =============================================================================
// ATTEMPT STATE (transient)
// =============================================================================

/// An in-progress attempt, recomputed from the hops store on every call.
///
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptState {
    pub id: String,
    pub owner_id: String,
    pub puzzle_id: String,
    pub hop_ids: Vec<String>,
    pub associations_key: String,
    /// Words still open after folding every accepted hop.
    pub open_edges: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: u64,
    /// Unix epoch milliseconds.
    pub updated_at: u64,
}

// =============================================================================
// SOLVE (durable)
// =============================================================================

/// The immutable record of a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solve {
    /// Equal to the attempt id.
    pub id: String,
    pub owner_id: String,
    pub puzzle_id: String,
    /// Hop ids in merge order (not sorted).
    pub hop_ids: Vec<String>,
    /// Hop count minus one.
    pub length: usize,
    pub associations_key: String,
    /// `ownerId|puzzleId|sortedHopIds` uniqueness fingerprint.
    pub composite_key: String,
    /// Unix epoch milliseconds.
    pub created_at: u64,
}

// =============================================================================
// ATTEMPT OUTCOME
// =============================================================================

/// Result of one hop attempt: still open, or committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Pending(AttemptState),
    Completed(Solve),
}

impl AttemptOutcome {
    /// True when the attempt produced a committed solve.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Hop ids accumulated so far, in merge order.
    #[must_use]
    pub fn hop_ids(&self) -> &[String] {
        match self {
            Self::Pending(state) => &state.hop_ids,
            Self::Completed(solve) => &solve.hop_ids,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in hopchain.
///
/// - No silent failures: degraded reads are decided by the caller, not here
/// - Foreign errors (database, HTTP, codecs) are carried as strings
#[derive(Debug, Error)]
pub enum ChainError {
    /// Owner, puzzle or attempt id was not supplied.
    #[error("Missing required context: {0}")]
    MissingContext(String),

    /// The candidate word is empty or too long.
    #[error("Invalid word: {0}")]
    InvalidWord(String),

    /// The candidate word did not link to any open edge.
    #[error("No valid hops found for '{word}'")]
    NoValidHops { word: String },

    /// A solve with the same owner, puzzle and hop set already exists.
    #[error("Duplicate solve: {composite_key}")]
    DuplicateSolve { composite_key: String },

    /// A collaborator could not be reached or returned a failure.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The puzzle definition cannot be played.
    #[error("Invalid puzzle: {0}")]
    InvalidPuzzle(String),

    /// The hop history does not close every open edge.
    #[error("Attempt incomplete: {open_edges} open edges remain")]
    Incomplete { open_edges: usize },

    /// The store refused to overwrite an existing record.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ChainError {
    /// Stable snake_case tag for API responses and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingContext(_) => "missing_context",
            Self::InvalidWord(_) => "invalid_word",
            Self::NoValidHops { .. } => "no_valid_hops",
            Self::DuplicateSolve { .. } => "duplicate_solve",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::InvalidPuzzle(_) => "invalid_puzzle",
            Self::Incomplete { .. } => "incomplete",
            Self::Conflict(_) => "conflict",
            Self::StorageError(_) => "storage_error",
            Self::SerializationError(_) => "serialization_error",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_splits_on_first_separator() {
        let hop = Hop::new("h1", "start", "middle");
        assert_eq!(hop.canonical_pair(), Some(("start", "middle")));

        let backwards = Hop::new("h2", "deceit", "chicanery").with_link_key("chicanery::deceit");
        assert_eq!(backwards.canonical_pair(), Some(("chicanery", "deceit")));
    }

    #[test]
    fn canonical_pair_rejects_missing_separator() {
        let hop = Hop::new("h1", "a", "b").with_link_key("a-b");
        assert_eq!(hop.canonical_pair(), None);
    }

    #[test]
    fn context_resolves_when_complete() {
        let ids = AttemptContext::new("owner", "puzzle", "attempt")
            .resolve()
            .unwrap();
        assert_eq!(ids.owner_id, "owner");
        assert_eq!(ids.puzzle_id, "puzzle");
        assert_eq!(ids.attempt_id, "attempt");
    }

    #[test]
    fn context_reports_first_missing_field() {
        let mut ctx = AttemptContext::new("owner", "puzzle", "attempt");
        ctx.puzzle_id = None;
        match ctx.resolve() {
            Err(ChainError::MissingContext(field)) => assert_eq!(field, "puzzleId"),
            other => panic!("expected MissingContext, got {:?}", other),
        }
    }

    #[test]
    fn context_treats_blank_as_missing() {
        let ctx = AttemptContext::new("  ", "puzzle", "attempt");
        assert!(matches!(ctx.resolve(), Err(ChainError::MissingContext(_))));
    }

    #[test]
    fn context_keeps_identifiers_verbatim() {
        let ids = AttemptContext::new("owner", "puzzle", " attempt-1 ")
            .resolve()
            .unwrap();
        assert_eq!(ids.attempt_id, " attempt-1 ");
    }

    #[test]
    fn puzzle_needs_two_words() {
        let puzzle = Puzzle::new("p", vec!["solo".to_string()]);
        assert!(matches!(
            puzzle.validate(),
            Err(ChainError::InvalidPuzzle(_))
        ));

        let puzzle = Puzzle::new("p", vec!["a".to_string(), "b".to_string()]);
        assert!(puzzle.validate().is_ok());
    }

    #[test]
    fn error_kinds_are_stable() {
        let err = ChainError::NoValidHops {
            word: "x".to_string(),
        };
        assert_eq!(err.kind(), "no_valid_hops");
        assert_eq!(err.to_string(), "No valid hops found for 'x'");
    }
}
