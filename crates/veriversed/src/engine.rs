//! Run lifecycle controller.
//!
//! The one front door the (excluded) HTTP layer talks to: submit claim,
//! record vote, read claim, read leaderboard, force scoring. Per-claim
//! mutual exclusion serializes every read-modify-write on a claim;
//! reviewer updates go through a compare-and-swap retry loop because two
//! claims can score the same reviewer concurrently.

use crate::audit::{AuditKind, AuditLog};
use crate::capabilities::{generate_with_retry, AnswerGenerator};
use crate::locks::KeyedLocks;
use crate::store::KvStore;
use crate::votes::{validate_vote_input, VoteThrottle};
use chrono::Utc;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;
use veriverse_core::config::Config;
use veriverse_core::confidence;
use veriverse_core::error::{EngineError, Result};
use veriverse_core::leaderboard::{self, LeaderboardSnapshot};
use veriverse_core::model::{
    ClaimRecord, GroundTruth, Reviewer, RunStatus, VoteDirection, VoteRecord,
};
use veriverse_core::registry::SourceRegistry;
use veriverse_core::topics::{self, Topic};
use veriverse_core::weighting::WeightComponents;

/// Result of a claim submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub run_id: String,
    pub status: RunStatus,
}

pub struct ClaimEngine {
    pub(crate) config: Config,
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) registry: SourceRegistry,
    pub(crate) locks: KeyedLocks,
    pub(crate) audit: AuditLog,
    answer_generator: Arc<dyn AnswerGenerator>,
    throttle: VoteThrottle,
    /// Latest complete snapshot, replaced wholesale after each scoring
    /// pass. Readers clone the Arc and never see a partial board.
    leaderboard: RwLock<Arc<LeaderboardSnapshot>>,
}

impl ClaimEngine {
    pub fn new(
        config: Config,
        store: Arc<dyn KvStore>,
        answer_generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        let registry = SourceRegistry::with_overrides(&config.registry);
        let throttle = VoteThrottle::new(&config.throttle);
        let audit = AuditLog::new(&config.daemon.data_dir);

        let engine = Self {
            store,
            registry,
            locks: KeyedLocks::new(),
            audit,
            answer_generator,
            throttle,
            leaderboard: RwLock::new(Arc::new(LeaderboardSnapshot::empty())),
            config,
        };
        engine.seed_roster();
        engine.rebuild_leaderboard();
        engine
    }

    /// Pre-seed reviewers from config so the leaderboard has faces before
    /// the first vote arrives. Existing records win over the roster.
    fn seed_roster(&self) {
        for entry in &self.config.roster {
            if self.store.get_reviewer(&entry.reviewer_id).is_some() {
                continue;
            }
            let reviewer = Reviewer {
                reviewer_id: entry.reviewer_id.clone(),
                display_name: entry.name.clone(),
                expertise: entry.expertise.iter().map(|t| Topic::parse(t)).collect(),
                correct: 0,
                attempts: 0,
                points: 0.0,
                last_active_at: None,
            };
            if let Err(e) = self.store.put_reviewer(reviewer, None) {
                warn!("Failed to seed reviewer {}: {}", entry.reviewer_id, e);
            }
        }
        if !self.config.roster.is_empty() {
            info!("Seeded {} roster reviewers", self.config.roster.len());
        }
    }

    /// Submit a claim: create the record, run answer generation with
    /// bounded retries, and land in `awaiting_votes` (or `failed`).
    pub async fn submit_claim(&self, prompt: &str, requester: &str) -> Result<SubmitOutcome> {
        let trimmed = prompt.trim();
        if trimmed.len() < 4 {
            return Err(EngineError::InvalidInput("prompt too short".to_string()));
        }
        if trimmed.len() > 2000 {
            return Err(EngineError::InvalidInput("prompt too long".to_string()));
        }

        let run_id = Uuid::new_v4().to_string();
        let topics = topics::classify(trimmed);
        let now = Utc::now();

        let mut claim = ClaimRecord::new(
            run_id.clone(),
            trimmed.to_string(),
            requester.to_string(),
            topics,
            now,
        );
        let version = self.store.put_claim(claim.clone(), None)?;

        claim.status = RunStatus::InProgress;
        let version = self.store.put_claim(claim.clone(), Some(version))?;

        match generate_with_retry(
            self.answer_generator.as_ref(),
            trimmed,
            &self.config.answer,
        )
        .await
        {
            Ok(answer) => {
                claim.provisional_answer = Some(answer.answer_text);
                claim.evidence = answer.evidence;
                claim.seed_confidence = answer.seed_confidence.clamp(0.0, 1.0);
                claim.confidence = claim.seed_confidence;
                claim.status = RunStatus::AwaitingVotes;
                info!(
                    "Claim {} awaiting votes (topics: {:?}, seed confidence {:.3})",
                    run_id, claim.topics, claim.seed_confidence
                );
            }
            Err(e) => {
                claim.status = RunStatus::Failed;
                claim.failure_reason = Some(match e {
                    EngineError::CapabilityTimeout(_) => {
                        "answer generation timed out".to_string()
                    }
                    _ => "answer generation failed".to_string(),
                });
                warn!("Claim {} failed: {}", run_id, e);
            }
        }

        self.store.put_claim(claim.clone(), Some(version))?;
        self.audit.record_or_warn(AuditKind::ClaimSubmitted {
            run_id: run_id.clone(),
            status: format!("{:?}", claim.status),
        });

        Ok(SubmitOutcome {
            run_id,
            status: claim.status,
        })
    }

    /// Record one reviewer vote and return the recomputed confidence.
    /// The aggregator runs synchronously under the claim lock, so the
    /// caller observes the updated value before this returns.
    pub async fn record_vote(
        &self,
        run_id: &str,
        reviewer_id: &str,
        direction: VoteDirection,
        rationale: &str,
    ) -> Result<f64> {
        let _guard = self.locks.acquire(run_id).await;

        let stored = self
            .store
            .get_claim(run_id)
            .ok_or_else(|| EngineError::NotFound(run_id.to_string()))?;
        let mut claim = stored.value;

        if claim.is_resolved() {
            return Err(EngineError::InvalidState(format!(
                "run {} is already resolved",
                run_id
            )));
        }
        if !claim.status.accepts_votes() {
            return Err(EngineError::InvalidState(format!(
                "run {} is not accepting votes",
                run_id
            )));
        }

        validate_vote_input(reviewer_id, rationale, &self.config.throttle)?;
        if claim.requester == reviewer_id {
            return Err(EngineError::InvalidInput(
                "claim author cannot vote on their own claim".to_string(),
            ));
        }
        if claim.has_vote_from(reviewer_id) {
            return Err(EngineError::DuplicateVote {
                run_id: run_id.to_string(),
                reviewer_id: reviewer_id.to_string(),
            });
        }

        let now = Utc::now();
        // Last in the chain: rejected votes never consume throttle budget
        self.throttle.check_and_record(reviewer_id, now)?;

        let reviewer = self
            .store
            .get_reviewer(reviewer_id)
            .map(|v| v.value)
            .unwrap_or_else(|| Reviewer::new(reviewer_id));

        let weights =
            WeightComponents::capture(&reviewer, &claim.topics, now, &self.config.weights);
        let weight = weights.combine(&self.config.weights);

        claim.votes.push(VoteRecord {
            reviewer_id: reviewer_id.to_string(),
            direction,
            rationale: rationale.to_string(),
            weights,
            weight,
            cast_at: now,
        });
        claim.confidence = confidence::recompute(&claim.votes, claim.seed_confidence);
        if claim.status == RunStatus::AwaitingVotes
            && claim.votes.len() >= self.config.lifecycle.required_votes
        {
            claim.status = RunStatus::Completed;
        }

        let confidence = claim.confidence;
        self.store.put_claim(claim, Some(stored.version))?;

        self.update_reviewer(reviewer_id, |r| {
            r.last_active_at = Some(now);
        })?;

        self.audit.record_or_warn(AuditKind::VoteRecorded {
            run_id: run_id.to_string(),
            reviewer_id: reviewer_id.to_string(),
            confidence,
        });
        info!(
            "Vote recorded on {} by {} (weight {:.3}, confidence {:.3})",
            run_id, reviewer_id, weight, confidence
        );

        Ok(confidence)
    }

    /// Current projection of a claim: record, votes and evidence.
    pub fn get_claim(&self, run_id: &str) -> Result<ClaimRecord> {
        self.store
            .get_claim(run_id)
            .map(|v| v.value)
            .ok_or_else(|| EngineError::NotFound(run_id.to_string()))
    }

    /// Latest complete leaderboard snapshot.
    pub fn get_leaderboard(&self) -> Arc<LeaderboardSnapshot> {
        self.leaderboard.read().unwrap().clone()
    }

    /// Assign a verdict exactly once. Returns false (a logged no-op, not
    /// an error) if the claim is already resolved — concurrent sweeps and
    /// replays both land here.
    pub async fn apply_resolution(
        &self,
        run_id: &str,
        verdict: GroundTruth,
        resolver: &str,
    ) -> Result<bool> {
        let _guard = self.locks.acquire(run_id).await;

        let stored = self
            .store
            .get_claim(run_id)
            .ok_or_else(|| EngineError::NotFound(run_id.to_string()))?;
        let mut claim = stored.value;

        if claim.is_resolved() {
            warn!("Ignoring double resolution attempt for {}", run_id);
            self.audit.record_or_warn(AuditKind::ConsistencyEvent {
                run_id: run_id.to_string(),
                detail: "double resolution attempt ignored".to_string(),
            });
            return Ok(false);
        }

        claim.ground_truth = Some(verdict);
        claim.resolved_at = Some(Utc::now());
        claim.resolved_by = Some(resolver.to_string());
        claim.status = RunStatus::Completed;
        self.store.put_claim(claim, Some(stored.version))?;

        self.audit.record_or_warn(AuditKind::ClaimResolved {
            run_id: run_id.to_string(),
            verdict,
            resolved_by: resolver.to_string(),
        });
        info!("Claim {} resolved as {:?} by {}", run_id, verdict, resolver);
        Ok(true)
    }

    /// Rebuild the leaderboard from the full reviewer set and swap it in.
    pub(crate) fn rebuild_leaderboard(&self) {
        let reviewers = self.store.list_reviewers();
        let snapshot = leaderboard::build(&reviewers, &self.config.rewards, Utc::now());
        *self.leaderboard.write().unwrap() = Arc::new(snapshot);
    }

    /// Read-modify-write a reviewer with CAS retries. The closure must be
    /// a pure mutation: on a version miss it is re-applied to the fresh
    /// record.
    pub(crate) fn update_reviewer<F>(&self, reviewer_id: &str, mut mutate: F) -> Result<Reviewer>
    where
        F: FnMut(&mut Reviewer),
    {
        loop {
            match self.store.get_reviewer(reviewer_id) {
                Some(stored) => {
                    let mut reviewer = stored.value;
                    mutate(&mut reviewer);
                    match self.store.put_reviewer(reviewer.clone(), Some(stored.version)) {
                        Ok(_) => return Ok(reviewer),
                        Err(_) => continue, // lost the race, retry on fresh copy
                    }
                }
                None => {
                    let mut reviewer = Reviewer::new(reviewer_id);
                    mutate(&mut reviewer);
                    match self.store.put_reviewer(reviewer.clone(), None) {
                        Ok(_) => return Ok(reviewer),
                        Err(_) => continue,
                    }
                }
            }
        }
    }
}
