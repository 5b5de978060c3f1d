//! Vote weight computation.
//!
//! Components are captured at vote time and frozen: recency decay is
//! computed relative to the vote timestamp, never "now", so recomputing
//! confidence from a stored vote set yields the same value on every
//! replay. The blend is monotonic increasing in each component and
//! clamped to [0,1].

use crate::config::WeightConfig;
use crate::model::Reviewer;
use crate::topics::Topic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw weight components, each in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightComponents {
    /// Reviewer running precision at vote time (0.5 for unseen reviewers)
    pub precision: f64,
    /// Expertise overlap with the claim's topic set
    pub relevance: f64,
    /// Decay of time since the reviewer's previous activity
    pub recency: f64,
}

impl WeightComponents {
    /// Capture components for a vote being cast at `cast_at`.
    pub fn capture(
        reviewer: &Reviewer,
        claim_topics: &[Topic],
        cast_at: DateTime<Utc>,
        config: &WeightConfig,
    ) -> Self {
        Self {
            precision: reviewer.precision(),
            relevance: relevance(&reviewer.expertise, claim_topics),
            recency: recency(reviewer.last_active_at, cast_at, config.recency_half_life_secs),
        }
    }

    /// Blend the components into a single combined weight.
    ///
    /// Convex combination with the configured coefficients; clamped to
    /// [0,1] in case an operator configures coefficients summing above 1.
    pub fn combine(&self, config: &WeightConfig) -> f64 {
        let raw = config.precision_weight * self.precision
            + config.relevance_weight * self.relevance
            + config.recency_weight * self.recency;
        raw.clamp(0.0, 1.0)
    }
}

/// Fraction of claim topics covered by the reviewer's expertise.
///
/// `General` counts as a match for every reviewer: a claim that falls
/// through to the fallback topic should not zero out the crowd's weight.
pub fn relevance(expertise: &[Topic], claim_topics: &[Topic]) -> f64 {
    if claim_topics.is_empty() {
        return 0.0;
    }
    let matched = claim_topics
        .iter()
        .filter(|t| **t == Topic::General || expertise.contains(t))
        .count();
    matched as f64 / claim_topics.len() as f64
}

/// Exponential half-life decay of reviewer staleness, in (0,1].
///
/// A reviewer with no prior activity is treated as fresh. Negative deltas
/// (clock skew) clamp to fresh rather than overweighting.
pub fn recency(
    last_active_at: Option<DateTime<Utc>>,
    cast_at: DateTime<Utc>,
    half_life_secs: u64,
) -> f64 {
    let last = match last_active_at {
        Some(t) => t,
        None => return 1.0,
    };
    let idle_secs = (cast_at - last).num_seconds().max(0) as f64;
    if half_life_secs == 0 {
        return 1.0;
    }
    0.5_f64.powf(idle_secs / half_life_secs as f64)
}
