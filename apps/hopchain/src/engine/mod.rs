//! # Solve Engine
//!
//! The async half of hopchain. `Engine` owns the collaborator clients and
//! the solve book and drives:
//! - `attempt_hop`: one hop attempt, fanned out to every open edge
//! - `finalize`: fingerprint, duplicate check, conditional commit
//! - `finalize_batch`: finalize many completed attempts at once
//! - `get_solve` / `query_solves`: cached reads
//!
//! There is no per-attempt lock. Two racing finalizations for the same path
//! are settled by the store's conditional create.

mod attempt;
mod batch;
mod finalize;
mod solves;

pub use batch::{BatchItem, BatchRecord, BatchReport};
pub use solves::SolveBook;

use crate::collaborators::{GamesApi, HopsApi};
use hopchain_core::{ChainError, Solve, SolveQuery};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds. A clock before 1970 reads as zero.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Orchestrates hop attempts and solve commits.
pub struct Engine<H, G> {
    hops: H,
    games: G,
    solves: SolveBook,
    /// Upper bound on each fan-out branch.
    hop_timeout: Duration,
}

impl<H, G> std::fmt::Debug for Engine<H, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("solves", &self.solves)
            .field("hop_timeout", &self.hop_timeout)
            .finish_non_exhaustive()
    }
}

impl<H: HopsApi, G: GamesApi> Engine<H, G> {
    pub fn new(hops: H, games: G, solves: SolveBook, hop_timeout: Duration) -> Self {
        Self {
            hops,
            games,
            solves,
            hop_timeout,
        }
    }

    /// The solve book (store + caches).
    pub fn solves(&self) -> &SolveBook {
        &self.solves
    }

    /// Committed solve by id, through the point cache.
    pub fn get_solve(&self, id: &str) -> Result<Option<Solve>, ChainError> {
        self.solves.get(id)
    }

    /// Committed solves matching `query`, through the query cache.
    pub fn query_solves(&self, query: &SolveQuery) -> Result<Vec<Solve>, ChainError> {
        self.solves.query(query)
    }
}

// =============================================================================
// TEST FAKES
// =============================================================================
