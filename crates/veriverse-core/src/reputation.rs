//! Reviewer reputation scoring.
//!
//! Pure functions applied by the daemon's reward recalculator once per
//! resolved claim. An up-vote is correct against a TRUE verdict, a
//! down-vote against FALSE; votes on an UNVERIFIABLE claim count as
//! participation only and never touch precision.

use crate::config::RewardConfig;
use crate::model::{GroundTruth, Reviewer, VoteDirection};
use serde::{Deserialize, Serialize};

/// Discrete reputation bracket derived from precision and attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeTier {
    Gold,
    Silver,
    Bronze,
}

impl BadgeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeTier::Gold => "Gold",
            BadgeTier::Silver => "Silver",
            BadgeTier::Bronze => "Bronze",
        }
    }
}

/// How a single vote fared against the resolved verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Correct,
    Incorrect,
    /// Verdict was UNVERIFIABLE: no precision impact, small reward.
    Participation,
}

/// Classify a vote against the claim's ground truth.
pub fn classify_vote(direction: VoteDirection, verdict: GroundTruth) -> VoteOutcome {
    match verdict {
        GroundTruth::Unverifiable => VoteOutcome::Participation,
        GroundTruth::True => match direction {
            VoteDirection::Up => VoteOutcome::Correct,
            VoteDirection::Down => VoteOutcome::Incorrect,
        },
        GroundTruth::False => match direction {
            VoteDirection::Up => VoteOutcome::Incorrect,
            VoteDirection::Down => VoteOutcome::Correct,
        },
    }
}

/// Apply one scored vote to a reviewer record.
///
/// Correct votes earn base points scaled by the weight the vote carried
/// at cast time, so high-reputation votes are worth more to win.
pub fn apply_outcome(
    reviewer: &mut Reviewer,
    outcome: VoteOutcome,
    vote_weight: f64,
    config: &RewardConfig,
) {
    match outcome {
        VoteOutcome::Correct => {
            reviewer.attempts += 1;
            reviewer.correct += 1;
            reviewer.points += config.base_points * vote_weight;
        }
        VoteOutcome::Incorrect => {
            reviewer.attempts += 1;
        }
        VoteOutcome::Participation => {
            reviewer.points += config.participation_points;
        }
    }
}

/// Badge tier from fixed thresholds.
pub fn tier(precision: f64, attempts: u64, config: &RewardConfig) -> BadgeTier {
    if precision >= config.gold_precision && attempts >= config.gold_attempts {
        BadgeTier::Gold
    } else if precision >= config.silver_precision && attempts >= config.silver_attempts {
        BadgeTier::Silver
    } else {
        BadgeTier::Bronze
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RewardConfig {
        RewardConfig::default()
    }

    #[test]
    fn test_classify_against_true_verdict() {
        assert_eq!(
            classify_vote(VoteDirection::Up, GroundTruth::True),
            VoteOutcome::Correct
        );
        assert_eq!(
            classify_vote(VoteDirection::Down, GroundTruth::True),
            VoteOutcome::Incorrect
        );
    }

    #[test]
    fn test_classify_against_false_verdict() {
        assert_eq!(
            classify_vote(VoteDirection::Down, GroundTruth::False),
            VoteOutcome::Correct
        );
        assert_eq!(
            classify_vote(VoteDirection::Up, GroundTruth::False),
            VoteOutcome::Incorrect
        );
    }

    #[test]
    fn test_unverifiable_is_participation_either_way() {
        for direction in [VoteDirection::Up, VoteDirection::Down] {
            assert_eq!(
                classify_vote(direction, GroundTruth::Unverifiable),
                VoteOutcome::Participation
            );
        }
    }

    #[test]
    fn test_apply_correct_vote() {
        let mut reviewer = Reviewer::new("alice");
        apply_outcome(&mut reviewer, VoteOutcome::Correct, 0.8, &config());
        assert_eq!(reviewer.attempts, 1);
        assert_eq!(reviewer.correct, 1);
        assert_eq!(reviewer.points, 8.0);
        assert_eq!(reviewer.precision(), 1.0);
    }

    #[test]
    fn test_apply_incorrect_vote() {
        let mut reviewer = Reviewer::new("bob");
        apply_outcome(&mut reviewer, VoteOutcome::Incorrect, 0.8, &config());
        assert_eq!(reviewer.attempts, 1);
        assert_eq!(reviewer.correct, 0);
        assert_eq!(reviewer.points, 0.0);
        assert_eq!(reviewer.precision(), 0.0);
    }

    #[test]
    fn test_participation_leaves_precision_alone() {
        let mut reviewer = Reviewer::new("carol");
        reviewer.attempts = 4;
        reviewer.correct = 3;
        apply_outcome(&mut reviewer, VoteOutcome::Participation, 0.9, &config());
        assert_eq!(reviewer.attempts, 4);
        assert_eq!(reviewer.precision(), 0.75);
        assert_eq!(reviewer.points, 1.0);
    }

    #[test]
    fn test_tier_thresholds() {
        let cfg = config();
        assert_eq!(tier(0.95, 25, &cfg), BadgeTier::Gold);
        assert_eq!(tier(0.95, 19, &cfg), BadgeTier::Silver); // not enough attempts for gold
        assert_eq!(tier(0.80, 12, &cfg), BadgeTier::Silver);
        assert_eq!(tier(0.80, 5, &cfg), BadgeTier::Bronze);
        assert_eq!(tier(0.50, 100, &cfg), BadgeTier::Bronze);
    }
}
