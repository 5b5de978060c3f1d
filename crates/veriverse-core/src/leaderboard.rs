//! Leaderboard snapshot construction.
//!
//! The snapshot is derived and replaceable: regenerated wholesale after
//! every scoring pass and swapped in atomically by the daemon, so readers
//! never observe a partially updated board.

use crate::config::RewardConfig;
use crate::model::Reviewer;
use crate::reputation::{tier, BadgeTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub reviewer_id: String,
    pub name: String,
    pub precision: f64,
    pub attempts: u64,
    pub points: f64,
    pub tier: BadgeTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardSnapshot {
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            entries: Vec::new(),
        }
    }
}

/// Total order: points desc, precision desc, attempts desc, reviewer id
/// asc. The id tiebreak makes regeneration stable for identical inputs.
fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.points
        .partial_cmp(&a.points)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.precision.partial_cmp(&a.precision).unwrap_or(Ordering::Equal))
        .then_with(|| b.attempts.cmp(&a.attempts))
        .then_with(|| a.reviewer_id.cmp(&b.reviewer_id))
}

/// Build a fresh snapshot from the full reviewer set.
pub fn build(reviewers: &[Reviewer], config: &RewardConfig, now: DateTime<Utc>) -> LeaderboardSnapshot {
    let mut entries: Vec<LeaderboardEntry> = reviewers
        .iter()
        .map(|r| LeaderboardEntry {
            reviewer_id: r.reviewer_id.clone(),
            name: r.display_name.clone(),
            precision: r.precision(),
            attempts: r.attempts,
            points: r.points,
            tier: tier(r.precision(), r.attempts, config),
        })
        .collect();
    entries.sort_by(compare);

    LeaderboardSnapshot {
        generated_at: now,
        entries,
    }
}
