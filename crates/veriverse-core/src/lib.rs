//! VeriVerse core library - shared types and deterministic engine math.
//!
//! Everything in this crate is synchronous and reproducible: the same
//! inputs always produce the same weights, confidence values, verdicts
//! and leaderboard orderings. The daemon crate (`veriversed`) layers the
//! async lifecycle, storage and scheduling on top.

pub mod confidence;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod registry;
pub mod reputation;
pub mod topics;
pub mod weighting;

/// Crate version, stamped into status output and audit records.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
