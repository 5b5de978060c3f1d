//! VeriVerse daemon library - exposes modules for testing.

pub mod audit;
pub mod capabilities;
pub mod engine;
pub mod locks;
pub mod resolution;
pub mod scoring;
pub mod store;
pub mod votes;
