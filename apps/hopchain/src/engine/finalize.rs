//! Solve finalization.

use super::{Engine, now_millis};
use crate::collaborators::{GamesApi, HopsApi};
use hopchain_core::{AttemptIds, ChainError, Hop, Solve, SolveDraft};

impl<H: HopsApi, G: GamesApi> Engine<H, G> {
    /// Commit the solve for a completed hop history.
    ///
    /// `hops` must be in merge order. When another solve already holds the
    /// same composite key, this attempt's hops are deleted (best effort) and
    /// `DuplicateSolve` is returned. A lost race on the conditional create
    /// surfaces as `Conflict`.
    pub async fn finalize(&self, hops: &[Hop], ids: &AttemptIds) -> Result<Solve, ChainError> {
        let draft = SolveDraft::from_hops(ids, hops);

        if let Some(existing) = self.solves.find_by_composite_key(&draft.composite_key)? {
            tracing::info!(
                event = "duplicate_solve",
                attempt_id = %ids.attempt_id,
                existing_id = %existing.id,
                composite_key = %draft.composite_key,
                "Path already solved, discarding attempt hops"
            );
            if let Err(e) = self.hops.delete_hops(&ids.attempt_id).await {
                tracing::warn!(
                    event = "hop_cleanup_failed",
                    attempt_id = %ids.attempt_id,
                    error = %e,
                    "Could not delete hops of duplicate attempt"
                );
            }
            return Err(ChainError::DuplicateSolve {
                composite_key: draft.composite_key,
            });
        }

        let solve = draft.into_solve(now_millis());
        self.solves.commit(&solve)?;

        tracing::info!(
            event = "solve_committed",
            solve_id = %solve.id,
            owner_id = %solve.owner_id,
            puzzle_id = %solve.puzzle_id,
            length = solve.length,
            "Solve committed"
        );
        Ok(solve)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::SolveBook;
    use crate::engine::fakes::{FakeGames, FakeHops};
    use hopchain_core::{MemorySolveStore, ResultCache};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine(hops: FakeHops) -> Engine<FakeHops, FakeGames> {
        Engine::new(
            hops,
            FakeGames::default(),
            SolveBook::new(Arc::new(MemorySolveStore::new()), ResultCache::default()),
            Duration::from_millis(200),
        )
    }

    fn ids(attempt: &str) -> AttemptIds {
        AttemptIds {
            owner_id: "owner123".to_string(),
            puzzle_id: "game456".to_string(),
            attempt_id: attempt.to_string(),
        }
    }

    fn path() -> Vec<Hop> {
        vec![
            Hop::new("hop2", "start", "middle").with_associations("key1|key2"),
            Hop::new("hop1", "middle", "end").with_associations("key2|key3"),
        ]
    }

    #[tokio::test]
    async fn commits_fingerprinted_solve() {
        let engine = engine(FakeHops::default());
        let solve = engine.finalize(&path(), &ids("attempt-1")).await.unwrap();

        assert_eq!(solve.hop_ids, vec!["hop2", "hop1"]);
        assert_eq!(solve.composite_key, "owner123|game456|hop1,hop2");
        assert_eq!(solve.associations_key, "key1|key2|key3");
        assert_eq!(solve.length, 1);
        assert!(engine.hops.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_path_twice_is_duplicate_and_cleans_second_attempt() {
        let engine = engine(FakeHops::default());
        engine.finalize(&path(), &ids("attempt-1")).await.unwrap();

        let mut reordered = path();
        reordered.reverse();
        let err = engine
            .finalize(&reordered, &ids("attempt-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::DuplicateSolve { .. }));
        assert_eq!(*engine.hops.deleted.lock().unwrap(), vec!["attempt-2"]);
        assert_eq!(engine.solves().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn cleanup_failure_does_not_mask_duplicate() {
        let engine = engine(FakeHops {
            fail_delete: true,
            ..FakeHops::default()
        });
        engine.finalize(&path(), &ids("attempt-1")).await.unwrap();

        let err = engine.finalize(&path(), &ids("attempt-2")).await.unwrap_err();
        assert_eq!(err.kind(), "duplicate_solve");
        assert_eq!(engine.hops.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_attempt_id_with_new_path_conflicts() {
        let engine = engine(FakeHops::default());
        engine.finalize(&path(), &ids("attempt-1")).await.unwrap();

        let other = vec![Hop::new("hop9", "start", "end")];
        let err = engine.finalize(&other, &ids("attempt-1")).await.unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }
}
