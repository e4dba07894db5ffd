//! Batch finalization of completed attempts.
//!
//! Each record names an attempt whose hops should already close the puzzle.
//! Records settle independently: one failure never aborts the others.

use super::Engine;
use crate::collaborators::{GamesApi, HopsApi};
use futures::future::join_all;
use hopchain_core::{AttemptContext, ChainError, Solve, compute_open_edges};
use serde::{Deserialize, Serialize};

/// One attempt to finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default, alias = "gameId")]
    pub puzzle_id: Option<String>,
    #[serde(default, alias = "id")]
    pub attempt_id: Option<String>,
}

impl BatchRecord {
    fn context(&self) -> AttemptContext {
        AttemptContext {
            owner_id: self.owner_id.clone(),
            puzzle_id: self.puzzle_id.clone(),
            attempt_id: self.attempt_id.clone(),
        }
    }
}

/// Result for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub attempt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solve: Option<Solve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

/// Outcome of a whole batch, in record order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl<H: HopsApi, G: GamesApi> Engine<H, G> {
    /// Finalize every record concurrently.
    pub async fn finalize_batch(&self, records: &[BatchRecord]) -> BatchReport {
        let results = join_all(records.iter().map(|r| self.finalize_record(r))).await;

        let items: Vec<BatchItem> = records
            .iter()
            .zip(results)
            .map(|(record, result)| match result {
                Ok(solve) => BatchItem {
                    attempt_id: record.attempt_id.clone(),
                    solve: Some(solve),
                    error: None,
                    error_kind: None,
                },
                Err(e) => BatchItem {
                    attempt_id: record.attempt_id.clone(),
                    solve: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind().to_string()),
                },
            })
            .collect();

        let failed = items.iter().filter(|i| i.error.is_some()).count();
        let report = BatchReport {
            processed: items.len().saturating_sub(failed),
            failed,
            items,
        };

        tracing::info!(
            event = "batch_finalized",
            processed = report.processed,
            failed = report.failed,
            "Batch finalization complete"
        );
        report
    }

    async fn finalize_record(&self, record: &BatchRecord) -> Result<Solve, ChainError> {
        let ids = record.context().resolve()?;

        let (hops, puzzle) = tokio::join!(
            self.hops.list_hops(&ids.attempt_id),
            self.games.get_puzzle(&ids.puzzle_id)
        );
        let (hops, puzzle) = (hops?, puzzle?);
        puzzle.validate()?;

        let open = compute_open_edges(&puzzle.words, &hops);
        if !open.is_empty() {
            return Err(ChainError::Incomplete {
                open_edges: open.len(),
            });
        }

        self.finalize(&hops, &ids).await.inspect_err(|e| {
            tracing::warn!(
                event = "batch_record_failed",
                attempt_id = %ids.attempt_id,
                error = %e,
                "Batch record not finalized"
            );
        })
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
    use crate::engine::fakes::{FakeGames, FakeHops, words};
    use hopchain_core::{Hop, MemorySolveStore, Puzzle, ResultCache};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine(prior: Vec<Hop>) -> Engine<FakeHops, FakeGames> {
        Engine::new(
            FakeHops::with_prior(prior),
            FakeGames::with(Puzzle::new("game456", words(&["start", "end"]))),
            SolveBook::new(Arc::new(MemorySolveStore::new()), ResultCache::default()),
            Duration::from_millis(200),
        )
    }

    fn record(attempt: &str) -> BatchRecord {
        BatchRecord {
            owner_id: Some("owner123".to_string()),
            puzzle_id: Some("game456".to_string()),
            attempt_id: Some(attempt.to_string()),
        }
    }

    #[tokio::test]
    async fn complete_attempt_is_committed() {
        let engine = engine(vec![Hop::new("hop1", "start", "end")]);
        let report = engine.finalize_batch(&[record("attempt-1")]).await;

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.items[0].solve.as_ref().unwrap().id, "attempt-1");
    }

    #[tokio::test]
    async fn records_settle_independently() {
        let engine = engine(vec![Hop::new("hop1", "start", "end")]);
        let report = engine
            .finalize_batch(&[
                record("attempt-1"),
                BatchRecord {
                    owner_id: None,
                    ..record("attempt-2")
                },
            ])
            .await;

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.items[1].error_kind.as_deref(), Some("missing_context"));
    }

    #[tokio::test]
    async fn incomplete_attempt_is_rejected() {
        let engine = engine(vec![Hop::new("hop1", "start", "middle")]);
        let report = engine.finalize_batch(&[record("attempt-1")]).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.items[0].error_kind.as_deref(), Some("incomplete"));
        assert_eq!(engine.solves().count().unwrap(), 0);
    }

    #[test]
    fn record_accepts_legacy_field_names() {
        let parsed: BatchRecord = serde_json::from_value(serde_json::json!({
            "ownerId": "owner123", "gameId": "game456", "id": "attempt-1"
        }))
        .unwrap();
        assert_eq!(parsed, record("attempt-1"));
    }
}
