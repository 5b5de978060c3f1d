//! Versioned key-value store for claims and reviewers.
//!
//! The engine only needs get / put-if-version-matches semantics, so the
//! backing medium stays swappable (in-memory map, embedded database,
//! external store) without touching engine logic. Every write is atomic
//! at single-record granularity; a version mismatch means another writer
//! got there first and the caller decides whether that is a retry or a
//! consistency fault.

use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use veriverse_core::model::{ClaimRecord, Reviewer};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Version mismatch for {key}: expected {expected:?}, found {found:?}")]
    VersionMismatch {
        key: String,
        expected: Option<u64>,
        found: Option<u64>,
    },
}

impl From<StoreError> for veriverse_core::error::EngineError {
    fn from(e: StoreError) -> Self {
        // A CAS miss under the per-claim lock means an internal invariant
        // broke, not a caller mistake.
        veriverse_core::error::EngineError::ConsistencyViolation(e.to_string())
    }
}

/// A record plus the version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Storage seam for the engine. `expected = None` means "create, key must
/// not exist"; `expected = Some(v)` is a compare-and-swap against the
/// version returned by the matching `get`.
pub trait KvStore: Send + Sync {
    fn get_claim(&self, run_id: &str) -> Option<Versioned<ClaimRecord>>;
    fn put_claim(&self, claim: ClaimRecord, expected: Option<u64>) -> Result<u64, StoreError>;
    fn list_claims(&self) -> Vec<ClaimRecord>;

    fn get_reviewer(&self, reviewer_id: &str) -> Option<Versioned<Reviewer>>;
    fn put_reviewer(&self, reviewer: Reviewer, expected: Option<u64>) -> Result<u64, StoreError>;
    fn list_reviewers(&self) -> Vec<Reviewer>;
}

type Shelf<T> = RwLock<HashMap<String, (u64, T)>>;

/// In-memory store. Claims and reviewers are never deleted; versions
/// start at 1 and increment on every successful put.
#[derive(Default)]
pub struct MemoryStore {
    claims: Shelf<ClaimRecord>,
    reviewers: Shelf<Reviewer>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn get_from<T: Clone>(shelf: &Shelf<T>, key: &str) -> Option<Versioned<T>> {
    shelf.read().unwrap().get(key).map(|(version, value)| Versioned {
        value: value.clone(),
        version: *version,
    })
}

fn put_into<T>(
    shelf: &Shelf<T>,
    key: String,
    value: T,
    expected: Option<u64>,
) -> Result<u64, StoreError> {
    let mut map = shelf.write().unwrap();
    let found = map.get(&key).map(|(v, _)| *v);
    if found != expected {
        return Err(StoreError::VersionMismatch { key, expected, found });
    }
    let next = expected.unwrap_or(0) + 1;
    map.insert(key, (next, value));
    Ok(next)
}

impl KvStore for MemoryStore {
    fn get_claim(&self, run_id: &str) -> Option<Versioned<ClaimRecord>> {
        get_from(&self.claims, run_id)
    }

    fn put_claim(&self, claim: ClaimRecord, expected: Option<u64>) -> Result<u64, StoreError> {
        put_into(&self.claims, claim.run_id.clone(), claim, expected)
    }

    fn list_claims(&self) -> Vec<ClaimRecord> {
        self.claims
            .read()
            .unwrap()
            .values()
            .map(|(_, claim)| claim.clone())
            .collect()
    }

    fn get_reviewer(&self, reviewer_id: &str) -> Option<Versioned<Reviewer>> {
        get_from(&self.reviewers, reviewer_id)
    }

    fn put_reviewer(&self, reviewer: Reviewer, expected: Option<u64>) -> Result<u64, StoreError> {
        put_into(&self.reviewers, reviewer.reviewer_id.clone(), reviewer, expected)
    }

    fn list_reviewers(&self) -> Vec<Reviewer> {
        self.reviewers
            .read()
            .unwrap()
            .values()
            .map(|(_, reviewer)| reviewer.clone())
            .collect()
    }
}
