//! Error taxonomy for the claim engine.
//!
//! Client-correctable variants (`NotFound`, `InvalidState`, `DuplicateVote`,
//! `RateLimited`, `InvalidInput`) are surfaced to callers immediately.
//! Capability failures are retried boundedly before a claim goes `Failed`.
//! `ConsistencyViolation` is an internal fault: the one-shot guards turn
//! the second attempt into a no-op and log it, callers never see it for
//! resolution or scoring replays.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("Invalid state for operation: {0}")]
    InvalidState(String),

    #[error("Reviewer {reviewer_id} already voted on run {run_id}")]
    DuplicateVote { run_id: String, reviewer_id: String },

    #[error("Reviewer {0} exceeded the voting rate limit")]
    RateLimited(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Capability call timed out: {0}")]
    CapabilityTimeout(String),

    #[error("Capability error: {0}")]
    CapabilityError(String),

    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Stable numeric code for wire serialization by the HTTP layer.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::NotFound(_) => -31000,
            EngineError::InvalidState(_) => -31001,
            EngineError::DuplicateVote { .. } => -31002,
            EngineError::RateLimited(_) => -31003,
            EngineError::InvalidInput(_) => -31004,
            EngineError::CapabilityTimeout(_) => -31010,
            EngineError::CapabilityError(_) => -31011,
            EngineError::ConsistencyViolation(_) => -31020,
            EngineError::Store(_) => -31021,
            EngineError::Io(_) => -31030,
            EngineError::Json(_) => -31700,
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound(_)
                | EngineError::InvalidState(_)
                | EngineError::DuplicateVote { .. }
                | EngineError::RateLimited(_)
                | EngineError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = vec![
            EngineError::NotFound("x".into()),
            EngineError::InvalidState("x".into()),
            EngineError::DuplicateVote {
                run_id: "r".into(),
                reviewer_id: "u".into(),
            },
            EngineError::RateLimited("u".into()),
            EngineError::InvalidInput("x".into()),
            EngineError::CapabilityTimeout("x".into()),
            EngineError::CapabilityError("x".into()),
            EngineError::ConsistencyViolation("x".into()),
            EngineError::Store("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(EngineError::RateLimited("u".into()).is_client_error());
        assert!(!EngineError::CapabilityTimeout("t".into()).is_client_error());
        assert!(!EngineError::ConsistencyViolation("c".into()).is_client_error());
    }
}
