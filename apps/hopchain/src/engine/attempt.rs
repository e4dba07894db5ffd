//! Hop attempts.

use super::{Engine, now_millis};
use crate::collaborators::{GamesApi, HopsApi};
use futures::future::join_all;
use hopchain_core::primitives::MAX_WORD_LENGTH;
use hopchain_core::{
    AttemptContext, AttemptIds, AttemptOutcome, AttemptState, ChainError, Hop, compute_open_edges,
};

impl<H: HopsApi, G: GamesApi> Engine<H, G> {
    /// Try to link `word` to every open edge of the caller's attempt.
    ///
    /// The open edges are recomputed from the hops store on every call. When
    /// the merged history leaves no open edge the attempt is finalized and
    /// `Completed` is returned; otherwise `Pending` carries the transient
    /// state, which is never stored.
    pub async fn attempt_hop(
        &self,
        word: &str,
        context: &AttemptContext,
    ) -> Result<AttemptOutcome, ChainError> {
        let ids = context.resolve()?;
        validate_word(word)?;

        let (prior, puzzle) = tokio::join!(
            self.prior_hops(&ids.attempt_id),
            self.games.get_puzzle(&ids.puzzle_id)
        );
        let puzzle = puzzle?;
        puzzle.validate()?;

        let open = compute_open_edges(&puzzle.words, &prior);
        let accepted = self.fan_out(&ids, &open, word).await;
        if accepted.is_empty() {
            tracing::info!(
                event = "no_valid_hops",
                attempt_id = %ids.attempt_id,
                word,
                open_edges = open.len(),
                "Candidate word linked to no open edge"
            );
            return Err(ChainError::NoValidHops {
                word: word.to_string(),
            });
        }

        let mut history = prior;
        history.extend(accepted);

        let remaining = compute_open_edges(&puzzle.words, &history);
        if !remaining.is_empty() {
            return Ok(AttemptOutcome::Pending(AttemptState::from_hops(
                &ids,
                &history,
                remaining,
                now_millis(),
            )));
        }

        self.finalize(&history, &ids)
            .await
            .map(AttemptOutcome::Completed)
    }

    /// Prior hops of an attempt. A failed read counts as no hops.
    async fn prior_hops(&self, attempt_id: &str) -> Vec<Hop> {
        match self.hops.list_hops(attempt_id).await {
            Ok(hops) => hops,
            Err(e) => {
                tracing::warn!(
                    event = "hop_fetch_degraded",
                    attempt_id,
                    error = %e,
                    "Could not load prior hops, continuing with none"
                );
                Vec::new()
            }
        }
    }

    /// Ask for `endpoint -> word` on every open edge at once and keep the
    /// hops that were accepted, in edge order.
    async fn fan_out(&self, ids: &AttemptIds, open: &[String], word: &str) -> Vec<Hop> {
        let branches = open.iter().map(|endpoint| async move {
            match tokio::time::timeout(self.hop_timeout, self.hops.create_hop(ids, endpoint, word))
                .await
            {
                Ok(Ok(hop)) => Some(hop),
                Ok(Err(e)) => {
                    tracing::debug!(
                        event = "link_rejected",
                        from = %endpoint,
                        to = word,
                        error = %e,
                        "Link attempt failed"
                    );
                    None
                }
                Err(_) => {
                    tracing::warn!(
                        event = "link_timeout",
                        from = %endpoint,
                        to = word,
                        timeout_ms = self.hop_timeout.as_millis() as u64,
                        "Link attempt timed out"
                    );
                    None
                }
            }
        });

        join_all(branches).await.into_iter().flatten().collect()
    }
}

fn validate_word(word: &str) -> Result<(), ChainError> {
    if word.trim().is_empty() {
        return Err(ChainError::InvalidWord("word is blank".to_string()));
    }
    if word.len() > MAX_WORD_LENGTH {
        return Err(ChainError::InvalidWord(format!(
            "word length {} exceeds maximum {} bytes",
            word.len(),
            MAX_WORD_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
