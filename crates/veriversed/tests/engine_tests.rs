//! End-to-end lifecycle tests: submit, vote, resolve, score, leaderboard.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use veriverse_core::config::Config;
use veriverse_core::error::{EngineError, Result};
use veriverse_core::model::{GroundTruth, RunStatus, VoteDirection};
use veriversed::capabilities::{
    AnswerGenerator, GeneratedAnswer, SourceQuery, SourceSignal, TemplateAnswerGenerator,
};
use veriversed::engine::ClaimEngine;
use veriversed::resolution::{ResolutionSweep, MODERATOR_ID};
use veriversed::store::MemoryStore;

struct FixedSourceQuery(SourceSignal);

#[async_trait]
impl SourceQuery for FixedSourceQuery {
    async fn query_domain(&self, _domain: &str, _claim_text: &str) -> Result<SourceSignal> {
        Ok(self.0)
    }
}

struct SlowSourceQuery;

#[async_trait]
impl SourceQuery for SlowSourceQuery {
    async fn query_domain(&self, _domain: &str, _claim_text: &str) -> Result<SourceSignal> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(SourceSignal::Corroborates)
    }
}

struct UnreachableSourceQuery;

#[async_trait]
impl SourceQuery for UnreachableSourceQuery {
    async fn query_domain(&self, _domain: &str, _claim_text: &str) -> Result<SourceSignal> {
        Err(EngineError::CapabilityError("connection refused".to_string()))
    }
}

struct FailingAnswerGenerator;

#[async_trait]
impl AnswerGenerator for FailingAnswerGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedAnswer> {
        Err(EngineError::CapabilityError("agent offline".to_string()))
    }
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.daemon.data_dir = dir.path().to_str().unwrap().to_string();
    config.resolution.maturity_secs = 0;
    config.resolution.sweep_interval_secs = 1;
    config.answer.timeout_secs = 5;
    config.answer.max_retries = 0;
    config.answer.retry_backoff_ms = 1;
    config
}

fn engine_with(dir: &TempDir) -> Arc<ClaimEngine> {
    Arc::new(ClaimEngine::new(
        test_config(dir),
        Arc::new(MemoryStore::new()),
        Arc::new(TemplateAnswerGenerator::new(0.7)),
    ))
}

#[tokio::test]
async fn test_submit_lands_in_awaiting_votes_with_seed_confidence() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);

    let outcome = engine.submit_claim("Is the Earth flat?", "anon").await.unwrap();
    assert_eq!(outcome.status, RunStatus::AwaitingVotes);

    let claim = engine.get_claim(&outcome.run_id).unwrap();
    assert_eq!(claim.confidence, 0.7);
    assert_eq!(claim.seed_confidence, 0.7);
    assert!(claim.provisional_answer.is_some());
    assert_eq!(claim.evidence.len(), 2);
    assert!(claim.ground_truth.is_none());
}

#[tokio::test]
async fn test_submit_rejects_bad_prompts() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);

    assert!(matches!(
        engine.submit_claim("   ", "anon").await,
        Err(EngineError::InvalidInput(_))
    ));
    let long = "x".repeat(2001);
    assert!(matches!(
        engine.submit_claim(&long, "anon").await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_failed_generation_marks_claim_failed() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(ClaimEngine::new(
        test_config(&dir),
        Arc::new(MemoryStore::new()),
        Arc::new(FailingAnswerGenerator),
    ));

    let outcome = engine.submit_claim("Is the Earth flat?", "anon").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Failed);

    let claim = engine.get_claim(&outcome.run_id).unwrap();
    assert_eq!(claim.failure_reason.as_deref(), Some("answer generation failed"));

    // Failed claims accept no votes
    let err = engine
        .record_vote(&outcome.run_id, "alice", VoteDirection::Up, "looks right")
        .await;
    assert!(matches!(err, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn test_votes_update_confidence_synchronously() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    let after_up = engine
        .record_vote(&run_id, "alice", VoteDirection::Up, "checked sources")
        .await
        .unwrap();
    assert!(after_up > 0.5);

    let after_down = engine
        .record_vote(&run_id, "bob", VoteDirection::Down, "contradicts reports")
        .await
        .unwrap();
    assert!(after_down > 0.0 && after_down < 1.0);

    // The returned value is what a subsequent read observes
    let claim = engine.get_claim(&run_id).unwrap();
    assert_eq!(claim.confidence, after_down);
    assert_eq!(claim.votes.len(), 2);
}

#[tokio::test]
async fn test_duplicate_vote_rejected_and_confidence_unchanged() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    let confidence = engine
        .record_vote(&run_id, "alice", VoteDirection::Up, "first")
        .await
        .unwrap();

    let err = engine
        .record_vote(&run_id, "alice", VoteDirection::Down, "changed my mind")
        .await;
    assert!(matches!(err, Err(EngineError::DuplicateVote { .. })));
    assert_eq!(engine.get_claim(&run_id).unwrap().confidence, confidence);
}

#[tokio::test]
async fn test_author_cannot_vote_on_own_claim() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "aakash")
        .await
        .unwrap()
        .run_id;

    let err = engine
        .record_vote(&run_id, "aakash", VoteDirection::Up, "trust me")
        .await;
    assert!(matches!(err, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn test_vote_on_unknown_run_is_not_found() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let err = engine
        .record_vote("no-such-run", "alice", VoteDirection::Up, "")
        .await;
    assert!(matches!(err, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn test_sixth_vote_in_window_is_rate_limited() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);

    // Six distinct claims, same reviewer, default K=5 per 60s
    let mut run_ids = Vec::new();
    for i in 0..6 {
        let outcome = engine
            .submit_claim(&format!("Claim number {} about something", i), "author")
            .await
            .unwrap();
        run_ids.push(outcome.run_id);
    }

    for run_id in &run_ids[..5] {
        engine
            .record_vote(run_id, "spammer", VoteDirection::Up, "")
            .await
            .unwrap();
    }
    let err = engine
        .record_vote(&run_ids[5], "spammer", VoteDirection::Up, "")
        .await;
    assert!(matches!(err, Err(EngineError::RateLimited(_))));
}

#[tokio::test]
async fn test_sweep_resolves_true_and_scores_reviewers() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    engine
        .record_vote(&run_id, "alice", VoteDirection::Up, "matches the data")
        .await
        .unwrap();
    engine
        .record_vote(&run_id, "bob", VoteDirection::Down, "seems off")
        .await
        .unwrap();

    let sweep = ResolutionSweep::new(
        engine.clone(),
        Arc::new(FixedSourceQuery(SourceSignal::Corroborates)),
    );
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.resolved, 1);

    let claim = engine.get_claim(&run_id).unwrap();
    assert_eq!(claim.ground_truth, Some(GroundTruth::True));
    assert_eq!(claim.resolved_by.as_deref(), Some(MODERATOR_ID));
    assert!(claim.resolved_at.is_some());
    assert!(claim.scored);
    assert_eq!(claim.status, RunStatus::Completed);

    // Alice was right, Bob was wrong
    let board = engine.get_leaderboard();
    assert_eq!(board.entries.len(), 2);
    assert_eq!(board.entries[0].reviewer_id, "alice");
    assert_eq!(board.entries[0].attempts, 1);
    assert!((board.entries[0].precision - 1.0).abs() < 1e-9);
    assert!(board.entries[0].points > 0.0);
    assert_eq!(board.entries[1].reviewer_id, "bob");
    assert_eq!(board.entries[1].attempts, 1);
    assert_eq!(board.entries[1].points, 0.0);
}

#[tokio::test]
async fn test_resolution_is_single_writer() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    let sweep = ResolutionSweep::new(
        engine.clone(),
        Arc::new(FixedSourceQuery(SourceSignal::Corroborates)),
    );
    sweep.run_once().await.unwrap();
    let first = engine.get_claim(&run_id).unwrap();

    // Second sweep and a direct replay are both no-ops
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.resolved, 0);
    let applied = engine
        .apply_resolution(&run_id, GroundTruth::False, "someone_else")
        .await
        .unwrap();
    assert!(!applied);

    let second = engine.get_claim(&run_id).unwrap();
    assert_eq!(second.ground_truth, Some(GroundTruth::True));
    assert_eq!(second.resolved_at, first.resolved_at);
    assert_eq!(second.resolved_by, first.resolved_by);
}

#[tokio::test]
async fn test_failing_source_queries_leave_claim_pending() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    // Every trusted source is unreachable this cycle
    let broken = ResolutionSweep::new(engine.clone(), Arc::new(UnreachableSourceQuery));
    let stats = broken.run_once().await.unwrap();
    assert_eq!(stats.examined, 1);
    assert_eq!(stats.resolved, 0);

    let claim = engine.get_claim(&run_id).unwrap();
    assert!(claim.ground_truth.is_none());
    assert!(claim.resolved_at.is_none());
    assert!(!claim.scored);

    // Sources recover: the next cycle resolves normally
    let healthy = ResolutionSweep::new(
        engine.clone(),
        Arc::new(FixedSourceQuery(SourceSignal::Corroborates)),
    );
    let stats = healthy.run_once().await.unwrap();
    assert_eq!(stats.resolved, 1);
    let claim = engine.get_claim(&run_id).unwrap();
    assert_eq!(claim.ground_truth, Some(GroundTruth::True));
}

#[tokio::test]
async fn test_timed_out_source_queries_leave_claim_pending() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.resolution.query_timeout_secs = 0;
    let engine = Arc::new(ClaimEngine::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(TemplateAnswerGenerator::default()),
    ));
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    let sweep = ResolutionSweep::new(engine.clone(), Arc::new(SlowSourceQuery));
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.resolved, 0);
    assert!(engine.get_claim(&run_id).unwrap().ground_truth.is_none());
}

#[tokio::test]
async fn test_unverifiable_awards_participation_only() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;
    engine
        .record_vote(&run_id, "alice", VoteDirection::Up, "")
        .await
        .unwrap();

    let sweep = ResolutionSweep::new(engine.clone(), Arc::new(FixedSourceQuery(SourceSignal::Silent)));
    sweep.run_once().await.unwrap();

    let claim = engine.get_claim(&run_id).unwrap();
    assert_eq!(claim.ground_truth, Some(GroundTruth::Unverifiable));

    let board = engine.get_leaderboard();
    let alice = board
        .entries
        .iter()
        .find(|e| e.reviewer_id == "alice")
        .unwrap();
    assert_eq!(alice.attempts, 0);
    assert_eq!(alice.points, 1.0); // participation points only
    assert!((alice.precision - 0.5).abs() < 1e-9); // default, untouched
}

#[tokio::test]
async fn test_concurrent_score_run_applies_once() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;
    engine
        .record_vote(&run_id, "alice", VoteDirection::Up, "")
        .await
        .unwrap();
    engine
        .apply_resolution(&run_id, GroundTruth::True, MODERATOR_ID)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let run_id = run_id.clone();
        handles.push(tokio::spawn(async move { engine.score_run(&run_id).await }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    // Attempts incremented exactly once, not once per call
    let board = engine.get_leaderboard();
    let alice = board
        .entries
        .iter()
        .find(|e| e.reviewer_id == "alice")
        .unwrap();
    assert_eq!(alice.attempts, 1);
}

#[tokio::test]
async fn test_score_run_on_unresolved_claim_is_invalid_state() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;

    let err = engine.score_run(&run_id).await;
    assert!(matches!(err, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn test_votes_rejected_after_resolution() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    let run_id = engine
        .submit_claim("Is the Earth flat?", "anon")
        .await
        .unwrap()
        .run_id;
    engine
        .apply_resolution(&run_id, GroundTruth::True, MODERATOR_ID)
        .await
        .unwrap();

    let err = engine
        .record_vote(&run_id, "late-voter", VoteDirection::Up, "")
        .await;
    assert!(matches!(err, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn test_sweep_is_single_flight() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with(&dir);
    engine.submit_claim("Is the Earth flat?", "anon").await.unwrap();

    let sweep = Arc::new(ResolutionSweep::new(engine, Arc::new(SlowSourceQuery)));
    let (first, second) = tokio::join!(sweep.run_once(), sweep.run_once());

    // Exactly one of the two concurrent cycles actually ran
    assert_eq!(first.is_some() as u8 + second.is_some() as u8, 1);
}

#[tokio::test]
async fn test_roster_seeds_leaderboard_before_first_vote() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.roster = vec![
        veriverse_core::config::RosterEntry {
            reviewer_id: "aneesha".to_string(),
            name: "Aneesha Manke".to_string(),
            expertise: vec!["Finance".to_string(), "Technology".to_string()],
        },
        veriverse_core::config::RosterEntry {
            reviewer_id: "shaurya".to_string(),
            name: "Shaurya Negi".to_string(),
            expertise: vec!["Finance".to_string()],
        },
    ];
    let engine = Arc::new(ClaimEngine::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(TemplateAnswerGenerator::default()),
    ));

    let board = engine.get_leaderboard();
    assert_eq!(board.entries.len(), 2);
    // Zero points all around: id tiebreak orders the board
    assert_eq!(board.entries[0].reviewer_id, "aneesha");
    assert_eq!(board.entries[0].name, "Aneesha Manke");
}
