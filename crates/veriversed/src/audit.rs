//! Append-only JSONL audit log of lifecycle events.
//!
//! Claims are never deleted, and this log is the corresponding trail for
//! everything that happened to them: submissions, votes, resolutions and
//! scoring passes. Uses JSONL for simplicity and robustness; malformed
//! lines are skipped on read for forward compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::warn;
use veriverse_core::model::GroundTruth;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditKind {
    ClaimSubmitted {
        run_id: String,
        status: String,
    },
    VoteRecorded {
        run_id: String,
        reviewer_id: String,
        confidence: f64,
    },
    ClaimResolved {
        run_id: String,
        verdict: GroundTruth,
        resolved_by: String,
    },
    ClaimScored {
        run_id: String,
        reviewers: usize,
    },
    ConsistencyEvent {
        run_id: String,
        detail: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: AuditKind,
}

/// Audit log backed by a JSONL file.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(data_dir: &str) -> Self {
        let path = PathBuf::from(data_dir).join("audit.jsonl");
        Self { path }
    }

    /// Append an event. Failures are surfaced to the caller, who logs and
    /// moves on: an audit write must never fail a lifecycle operation.
    pub fn record(&self, kind: AuditKind) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let event = AuditEvent {
            timestamp: Utc::now(),
            kind,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Convenience wrapper: record and log a warning on failure.
    pub fn record_or_warn(&self, kind: AuditKind) {
        if let Err(e) = self.record(kind) {
            warn!("Audit write failed: {}", e);
        }
    }

    /// Read all events back, skipping malformed lines.
    pub fn read_all(&self) -> std::io::Result<Vec<AuditEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("Skipping malformed audit line: {}", e);
                }
            }
        }

        Ok(events)
    }
}
