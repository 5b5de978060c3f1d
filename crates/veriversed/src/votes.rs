//! Vote ingestion guards: anti-spam throttle and payload validation.
//!
//! The throttle is a local policy, not a security boundary: it counts a
//! reviewer's accepted votes across all claims inside a sliding window
//! and rejects the overflow with `RateLimited`.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use veriverse_core::config::ThrottleConfig;
use veriverse_core::error::{EngineError, Result};

pub struct VoteThrottle {
    max_votes: usize,
    window: Duration,
    history: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl VoteThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            max_votes: config.max_votes,
            window: Duration::seconds(config.window_secs as i64),
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject a vote at `now`. Called last in the validation
    /// chain so rejected votes (duplicate, invalid) never consume budget.
    pub fn check_and_record(&self, reviewer_id: &str, now: DateTime<Utc>) -> Result<()> {
        let mut history = self.history.lock().unwrap();
        let entries = history.entry(reviewer_id.to_string()).or_default();

        let cutoff = now - self.window;
        while entries.front().is_some_and(|t| *t < cutoff) {
            entries.pop_front();
        }

        if entries.len() >= self.max_votes {
            return Err(EngineError::RateLimited(reviewer_id.to_string()));
        }

        entries.push_back(now);
        Ok(())
    }
}

/// Reject oversized or empty payload fields before they reach storage.
pub fn validate_vote_input(
    reviewer_id: &str,
    rationale: &str,
    config: &ThrottleConfig,
) -> Result<()> {
    if reviewer_id.trim().is_empty() {
        return Err(EngineError::InvalidInput("reviewer id is empty".to_string()));
    }
    if rationale.chars().count() > config.max_rationale_chars {
        return Err(EngineError::InvalidInput(format!(
            "rationale exceeds {} characters",
            config.max_rationale_chars
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_votes: usize, window_secs: u64) -> VoteThrottle {
        VoteThrottle::new(&ThrottleConfig {
            max_votes,
            window_secs,
            max_rationale_chars: 1000,
        })
    }

    #[test]
    fn test_sixth_vote_in_window_rejected() {
        let throttle = throttle(5, 60);
        let now = Utc::now();
        for _ in 0..5 {
            throttle.check_and_record("alice", now).unwrap();
        }
        let err = throttle.check_and_record("alice", now);
        assert!(matches!(err, Err(EngineError::RateLimited(_))));
    }

    #[test]
    fn test_window_slides() {
        let throttle = throttle(2, 60);
        let start = Utc::now();
        throttle.check_and_record("alice", start).unwrap();
        throttle.check_and_record("alice", start).unwrap();
        assert!(throttle.check_and_record("alice", start).is_err());

        // Old entries age out of the window
        let later = start + Duration::seconds(61);
        throttle.check_and_record("alice", later).unwrap();
    }

    #[test]
    fn test_reviewers_throttled_independently() {
        let throttle = throttle(1, 60);
        let now = Utc::now();
        throttle.check_and_record("alice", now).unwrap();
        throttle.check_and_record("bob", now).unwrap();
        assert!(throttle.check_and_record("alice", now).is_err());
    }

    #[test]
    fn test_rationale_length_cap() {
        let config = ThrottleConfig::default();
        let long = "x".repeat(config.max_rationale_chars + 1);
        assert!(matches!(
            validate_vote_input("alice", &long, &config),
            Err(EngineError::InvalidInput(_))
        ));
        let ok = "x".repeat(config.max_rationale_chars);
        assert!(validate_vote_input("alice", &ok, &config).is_ok());
    }

    #[test]
    fn test_empty_reviewer_rejected() {
        let config = ThrottleConfig::default();
        assert!(matches!(
            validate_vote_input("  ", "fine", &config),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
