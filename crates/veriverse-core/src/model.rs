//! Claim, vote and reviewer records.
//!
//! A claim is never deleted: the full vote set rides along with it so
//! confidence can always be recomputed from scratch. Ground truth is set
//! exactly once and immutable afterwards; `scored` is the one-shot marker
//! that gates reputation recalculation.

use crate::topics::Topic;
use crate::weighting::WeightComponents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status on the confidence path. Resolution state is tracked
/// orthogonally via `ground_truth`: a claim can be `Completed` while still
/// unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    AwaitingVotes,
    Completed,
    Failed,
}

impl RunStatus {
    /// Whether votes are accepted in this status.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, RunStatus::AwaitingVotes | RunStatus::Completed)
    }
}

/// Terminal verdict assigned by the resolution procedure. `Unverifiable`
/// is an explicit outcome, not an error, and is just as terminal as the
/// other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroundTruth {
    True,
    False,
    Unverifiable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Sign used by the confidence aggregator.
    pub fn sign(&self) -> f64 {
        match self {
            VoteDirection::Up => 1.0,
            VoteDirection::Down => -1.0,
        }
    }
}

/// One evidence item returned by the answer-generation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub tool_name: String,
    pub content: String,
    pub retrieved_at: DateTime<Utc>,
}

/// A single reviewer vote. Unique per (run_id, reviewer_id); weight
/// components are captured at vote time and frozen so that confidence
/// recomputation is deterministic and replay-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub reviewer_id: String,
    pub direction: VoteDirection,
    pub rationale: String,
    pub weights: WeightComponents,
    /// Combined weight in [0,1], derived from `weights` at vote time.
    pub weight: f64,
    pub cast_at: DateTime<Utc>,
}

/// One submitted claim and its end-to-end processing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub run_id: String,
    pub prompt: String,
    /// Submitting user; excluded from voting on their own claim.
    pub requester: String,
    pub topics: Vec<Topic>,
    pub provisional_answer: Option<String>,
    pub evidence: Vec<EvidenceItem>,
    /// Aggregate vote-derived belief in [0,1]. Equals `seed_confidence`
    /// while the vote set is empty.
    pub confidence: f64,
    pub seed_confidence: f64,
    pub status: RunStatus,
    /// Coarse, user-visible failure reason. Never a raw capability error.
    pub failure_reason: Option<String>,
    pub ground_truth: Option<GroundTruth>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    /// One-shot marker: reputation scoring already applied for this claim.
    pub scored: bool,
    pub votes: Vec<VoteRecord>,
    pub created_at: DateTime<Utc>,
}

impl ClaimRecord {
    pub fn new(run_id: String, prompt: String, requester: String, topics: Vec<Topic>, now: DateTime<Utc>) -> Self {
        Self {
            run_id,
            prompt,
            requester,
            topics,
            provisional_answer: None,
            evidence: Vec::new(),
            confidence: 0.0,
            seed_confidence: 0.0,
            status: RunStatus::Queued,
            failure_reason: None,
            ground_truth: None,
            resolved_at: None,
            resolved_by: None,
            scored: false,
            votes: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.ground_truth.is_some()
    }

    pub fn has_vote_from(&self, reviewer_id: &str) -> bool {
        self.votes.iter().any(|v| v.reviewer_id == reviewer_id)
    }

    /// Age of the claim at `now`, in whole seconds.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

/// Reviewer reputation record. Mutated only by the reward recalculator
/// (plus `last_active_at` on vote); never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub reviewer_id: String,
    pub display_name: String,
    pub expertise: Vec<Topic>,
    pub correct: u64,
    pub attempts: u64,
    pub points: f64,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Reviewer {
    /// Lazily created reviewer, first seen on vote.
    pub fn new(reviewer_id: &str) -> Self {
        Self {
            reviewer_id: reviewer_id.to_string(),
            display_name: reviewer_id.to_string(),
            expertise: Vec::new(),
            correct: 0,
            attempts: 0,
            points: 0.0,
            last_active_at: None,
        }
    }

    /// Running precision. Reviewers with no scored attempts get the
    /// neutral default of 0.5 so their first votes carry middling weight.
    pub fn precision(&self) -> f64 {
        if self.attempts == 0 {
            0.5
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }
}
