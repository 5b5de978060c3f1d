//! VeriVerse daemon - claim consensus and resolution engine.
//!
//! Wires the engine together with the in-process capability
//! implementations and runs the periodic resolution sweep until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use veriversed::capabilities::{KeywordSourceQuery, TemplateAnswerGenerator};
use veriversed::engine::ClaimEngine;
use veriversed::resolution::ResolutionSweep;
use veriversed::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("VeriVerse daemon v{} starting", veriverse_core::VERSION);

    let config = veriverse_core::config::Config::load();
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(ClaimEngine::new(
        config,
        store,
        Arc::new(TemplateAnswerGenerator::default()),
    ));

    let sweep = Arc::new(ResolutionSweep::new(
        engine.clone(),
        Arc::new(KeywordSourceQuery),
    ));
    let sweep_handle = sweep.spawn();

    info!("VeriVerse daemon ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gracefully");
    sweep_handle.abort();

    Ok(())
}
