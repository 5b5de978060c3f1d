//! Weighted confidence aggregation.
//!
//! Always a full recomputation from the vote set — no incremental update
//! path exists, which is what makes re-running it on an unchanged vote set
//! drift-free by construction.

use crate::model::VoteRecord;

/// Recompute a claim's confidence from its vote set.
///
/// `score = Σ(weight_i * sign_i) / Σ(weight_i)` mapped from [-1,1] to
/// [0,1]. Zero votes (or an all-zero-weight vote set) leave the seed
/// confidence untouched. Rounded to 3 decimals for a stable wire value.
pub fn recompute(votes: &[VoteRecord], seed_confidence: f64) -> f64 {
    let total_weight: f64 = votes.iter().map(|v| v.weight.abs()).sum();
    if total_weight == 0.0 {
        return seed_confidence;
    }

    let weighted: f64 = votes.iter().map(|v| v.weight * v.direction.sign()).sum();
    let score = weighted / total_weight;
    let confidence = (score + 1.0) / 2.0;
    round3(confidence)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
