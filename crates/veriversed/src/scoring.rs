//! Reputation & reward recalculation.
//!
//! Runs once per resolved claim: scores every vote against the verdict,
//! updates the reviewers, marks the claim scored and republishes the
//! leaderboard. The `scored` marker plus the per-claim lock make repeated
//! or concurrent invocations a no-op after the first.

use crate::audit::AuditKind;
use crate::engine::ClaimEngine;
use tracing::{debug, info};
use veriverse_core::error::{EngineError, Result};
use veriverse_core::reputation::{apply_outcome, classify_vote};

impl ClaimEngine {
    /// Score a resolved claim. Returns true if scoring was applied, false
    /// if the claim was already scored (idempotent no-op). `InvalidState`
    /// if the claim has no verdict yet.
    pub async fn score_run(&self, run_id: &str) -> Result<bool> {
        let _guard = self.locks.acquire(run_id).await;

        let stored = self
            .store
            .get_claim(run_id)
            .ok_or_else(|| EngineError::NotFound(run_id.to_string()))?;
        let mut claim = stored.value;

        let verdict = claim.ground_truth.ok_or_else(|| {
            EngineError::InvalidState(format!("run {} is not resolved yet", run_id))
        })?;

        if claim.scored {
            debug!("Claim {} already scored, skipping", run_id);
            return Ok(false);
        }

        let rewards = self.config.rewards.clone();
        for vote in &claim.votes {
            let outcome = classify_vote(vote.direction, verdict);
            let weight = vote.weight;
            self.update_reviewer(&vote.reviewer_id, |reviewer| {
                apply_outcome(reviewer, outcome, weight, &rewards);
            })?;
        }

        let reviewer_count = claim.votes.len();
        claim.scored = true;
        self.store.put_claim(claim, Some(stored.version))?;

        self.rebuild_leaderboard();
        self.audit.record_or_warn(AuditKind::ClaimScored {
            run_id: run_id.to_string(),
            reviewers: reviewer_count,
        });
        info!(
            "Scored claim {} ({:?}): {} reviewers updated",
            run_id, verdict, reviewer_count
        );
        Ok(true)
    }
}
