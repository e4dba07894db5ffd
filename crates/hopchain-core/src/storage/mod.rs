//! # Solve Storage
//!
//! The durable home of committed solves.
//!
//! Two backends implement `SolveStore`:
//! - `MemorySolveStore`: volatile, for tests and `--backend memory`
//! - `RedbSolveStore`: disk-backed ACID storage on redb
//!
//! `create` is conditional on both the solve id and its composite key. A
//! second write for either fails with `ChainError::Conflict` and leaves the
//! first record untouched.

mod memory;
mod redb_solves;

pub use memory::MemorySolveStore;
pub use redb_solves::RedbSolveStore;

use crate::query::SolveFilter;
use crate::{ChainError, Solve};

/// Durable solve records, shared across request handlers.
pub trait SolveStore: Send + Sync {
    /// Solve by id.
    fn get(&self, id: &str) -> Result<Option<Solve>, ChainError>;

    /// Solve whose composite key equals `composite_key`.
    fn find_by_composite_key(&self, composite_key: &str) -> Result<Option<Solve>, ChainError>;

    /// Insert `solve` unless its id or composite key is already taken.
    fn create(&self, solve: &Solve) -> Result<(), ChainError>;

    /// Every solve matching `filter`, ordered by id.
    fn query(&self, filter: &SolveFilter) -> Result<Vec<Solve>, ChainError>;

    /// Number of stored solves.
    fn count(&self) -> Result<usize, ChainError>;

    /// Backend label for status output.
    fn backend_name(&self) -> &'static str;
}
