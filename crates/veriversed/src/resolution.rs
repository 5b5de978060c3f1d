//! Automated moderator resolution sweep.
//!
//! A periodic task over unresolved claims past the maturity threshold:
//! look up the trusted domains for the claim's topics, ask each one, and
//! assign TRUE / FALSE / UNVERIFIABLE by quorum. Single-flight (a new
//! sweep never starts while one is running) and failure-isolated (one
//! claim's error never aborts the sweep for the rest).

use crate::capabilities::{SourceQuery, SourceSignal};
use crate::engine::ClaimEngine;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use veriverse_core::error::Result;
use veriverse_core::model::{ClaimRecord, GroundTruth};

/// Identity recorded on sweep-assigned verdicts.
pub const MODERATOR_ID: &str = "moderator_agent";

/// Counters from one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Claims that were mature and unresolved this cycle
    pub examined: usize,
    /// Claims that received a verdict
    pub resolved: usize,
}

/// Quorum rule: TRUE needs at least `quorum` corroborations and a strict
/// lead over contradictions; FALSE is symmetric; anything else is
/// UNVERIFIABLE (a terminal outcome, not an error).
pub fn decide_verdict(corroborations: usize, contradictions: usize, quorum: usize) -> GroundTruth {
    if corroborations >= quorum && corroborations > contradictions {
        GroundTruth::True
    } else if contradictions >= quorum && contradictions > corroborations {
        GroundTruth::False
    } else {
        GroundTruth::Unverifiable
    }
}

pub struct ResolutionSweep {
    engine: Arc<ClaimEngine>,
    source_query: Arc<dyn SourceQuery>,
    in_flight: AtomicBool,
}

impl ResolutionSweep {
    pub fn new(engine: Arc<ClaimEngine>, source_query: Arc<dyn SourceQuery>) -> Self {
        Self {
            engine,
            source_query,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Start the periodic sweep loop. Runs until the handle is aborted at
    /// shutdown.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let interval_secs = self.engine.config.resolution.sweep_interval_secs;
        tokio::spawn(async move {
            info!("Resolution sweep started (interval {}s)", interval_secs);
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            // First tick fires immediately; skip it so freshly submitted
            // claims get a full maturity window before the first pass.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Some(stats) = self.run_once().await {
                    info!(
                        "Sweep cycle complete: {} examined, {} resolved",
                        stats.examined, stats.resolved
                    );
                }
            }
        })
    }

    /// Run one sweep cycle. Returns None if a cycle is already in flight.
    pub async fn run_once(&self) -> Option<SweepStats> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sweep already running, skipping this cycle");
            return None;
        }

        let stats = self.sweep().await;
        self.in_flight.store(false, Ordering::SeqCst);
        Some(stats)
    }

    async fn sweep(&self) -> SweepStats {
        let now = Utc::now();
        let maturity = self.engine.config.resolution.maturity_secs as i64;
        let mut stats = SweepStats::default();

        for claim in self.engine.store.list_claims() {
            if claim.is_resolved() || !claim.status.accepts_votes() {
                continue;
            }
            if claim.age_secs(now) < maturity {
                continue;
            }

            stats.examined += 1;
            match self.resolve_claim(&claim).await {
                Ok(true) => stats.resolved += 1,
                Ok(false) => {}
                Err(e) => {
                    // Skipped until the next cycle, never dropped
                    warn!("Resolution failed for {}: {}", claim.run_id, e);
                }
            }
        }

        stats
    }

    async fn resolve_claim(&self, claim: &ClaimRecord) -> Result<bool> {
        let domains = self.engine.registry.domains_for(&claim.topics);
        if domains.is_empty() {
            debug!("No trusted sources for {}, leaving pending", claim.run_id);
            return Ok(false);
        }

        let timeout = Duration::from_secs(self.engine.config.resolution.query_timeout_secs);
        let mut corroborations = 0;
        let mut contradictions = 0;
        let mut failures = 0;

        for domain in &domains {
            match tokio::time::timeout(
                timeout,
                self.source_query.query_domain(domain, &claim.prompt),
            )
            .await
            {
                Ok(Ok(SourceSignal::Corroborates)) => corroborations += 1,
                Ok(Ok(SourceSignal::Contradicts)) => contradictions += 1,
                Ok(Ok(SourceSignal::Silent)) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    warn!("Source query {} failed for {}: {}", domain, claim.run_id, e);
                }
                Err(_) => {
                    failures += 1;
                    warn!("Source query {} timed out for {}", domain, claim.run_id);
                }
            }
        }

        let verdict = decide_verdict(
            corroborations,
            contradictions,
            self.engine.config.resolution.quorum,
        );
        // A transient failure must never become a terminal verdict: when
        // queries failed and the successful responses did not reach quorum,
        // the claim stays pending for the next cycle.
        if failures > 0 && verdict == GroundTruth::Unverifiable {
            debug!(
                "Claim {}: {} of {} source queries failed, deferring resolution",
                claim.run_id,
                failures,
                domains.len()
            );
            return Ok(false);
        }
        debug!(
            "Claim {}: {} corroborate, {} contradict -> {:?}",
            claim.run_id, corroborations, contradictions, verdict
        );

        let applied = self
            .engine
            .apply_resolution(&claim.run_id, verdict, MODERATOR_ID)
            .await?;
        if applied {
            self.engine.score_run(&claim.run_id).await?;
        }
        Ok(applied)
    }
}
