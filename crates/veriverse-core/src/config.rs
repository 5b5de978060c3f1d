//! Engine configuration.
//!
//! Loads settings from /etc/veriverse/config.toml or uses defaults.
//! Every tunable the consensus and resolution algorithms depend on lives
//! here (throttle window, weight coefficients, quorum, point values, tier
//! boundaries) so test suites can inject deterministic values instead of
//! fishing for scattered constants.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/veriverse/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/veriverse/config.toml";

/// Anti-spam throttle and payload bounds for vote ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum votes per reviewer inside the sliding window
    #[serde(default = "default_max_votes")]
    pub max_votes: usize,

    /// Sliding window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum rationale length in characters
    #[serde(default = "default_max_rationale_chars")]
    pub max_rationale_chars: usize,
}

fn default_max_votes() -> usize {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_rationale_chars() -> usize {
    1000
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_votes: default_max_votes(),
            window_secs: default_window_secs(),
            max_rationale_chars: default_max_rationale_chars(),
        }
    }
}

/// Vote weight blending coefficients. The blend is a convex combination,
/// so with coefficients summing to 1.0 the result stays in [0,1] and is
/// monotonic in every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(default = "default_precision_weight")]
    pub precision_weight: f64,

    #[serde(default = "default_relevance_weight")]
    pub relevance_weight: f64,

    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// Recency half-life in seconds: a reviewer idle for exactly this long
    /// carries half the recency credit of a fresh one.
    #[serde(default = "default_recency_half_life")]
    pub recency_half_life_secs: u64,
}

fn default_precision_weight() -> f64 {
    0.5
}

fn default_relevance_weight() -> f64 {
    0.3
}

fn default_recency_weight() -> f64 {
    0.2
}

fn default_recency_half_life() -> u64 {
    86_400 // one day
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            precision_weight: default_precision_weight(),
            relevance_weight: default_relevance_weight(),
            recency_weight: default_recency_weight(),
            recency_half_life_secs: default_recency_half_life(),
        }
    }
}

/// Resolution sweep tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Seconds between sweep cycles
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Minimum claim age before resolution is attempted
    #[serde(default = "default_maturity_secs")]
    pub maturity_secs: u64,

    /// Minimum corroborating (or contradicting) trusted sources for a
    /// TRUE (or FALSE) verdict
    #[serde(default = "default_quorum")]
    pub quorum: usize,

    /// Per-domain query timeout in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_sweep_interval() -> u64 {
    3_600
}

fn default_maturity_secs() -> u64 {
    3_600
}

fn default_quorum() -> usize {
    2
}

fn default_query_timeout() -> u64 {
    10
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            maturity_secs: default_maturity_secs(),
            quorum: default_quorum(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

/// Answer-generation capability bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_answer_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt before the claim goes `failed`
    #[serde(default = "default_answer_retries")]
    pub max_retries: u32,

    /// Base backoff between retries in milliseconds (doubles per attempt)
    #[serde(default = "default_answer_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_answer_timeout() -> u64 {
    30
}

fn default_answer_retries() -> u32 {
    2
}

fn default_answer_backoff() -> u64 {
    500
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_answer_timeout(),
            max_retries: default_answer_retries(),
            retry_backoff_ms: default_answer_backoff(),
        }
    }
}

/// Claim lifecycle tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Vote count at which a claim moves awaiting_votes -> completed
    #[serde(default = "default_required_votes")]
    pub required_votes: usize,
}

fn default_required_votes() -> usize {
    3
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            required_votes: default_required_votes(),
        }
    }
}

/// Reward points and badge tier boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Points for a correct vote, scaled by the vote's weight
    #[serde(default = "default_base_points")]
    pub base_points: f64,

    /// Flat points for voting on a claim resolved UNVERIFIABLE
    #[serde(default = "default_participation_points")]
    pub participation_points: f64,

    #[serde(default = "default_gold_precision")]
    pub gold_precision: f64,

    #[serde(default = "default_gold_attempts")]
    pub gold_attempts: u64,

    #[serde(default = "default_silver_precision")]
    pub silver_precision: f64,

    #[serde(default = "default_silver_attempts")]
    pub silver_attempts: u64,
}

fn default_base_points() -> f64 {
    10.0
}

fn default_participation_points() -> f64 {
    1.0
}

fn default_gold_precision() -> f64 {
    0.9
}

fn default_gold_attempts() -> u64 {
    20
}

fn default_silver_precision() -> f64 {
    0.75
}

fn default_silver_attempts() -> u64 {
    10
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_points: default_base_points(),
            participation_points: default_participation_points(),
            gold_precision: default_gold_precision(),
            gold_attempts: default_gold_attempts(),
            silver_precision: default_silver_precision(),
            silver_attempts: default_silver_attempts(),
        }
    }
}

/// Daemon-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Data directory for the audit log
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "/var/lib/veriverse".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// A pre-seeded reviewer loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub reviewer_id: String,
    pub name: String,
    #[serde(default)]
    pub expertise: Vec<String>,
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub weights: WeightConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub answer: AnswerConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub rewards: RewardConfig,

    /// Topic name -> trusted domains, merged over the built-in registry
    #[serde(default)]
    pub registry: HashMap<String, Vec<String>>,

    /// Reviewers seeded before the first vote arrives
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }
}
