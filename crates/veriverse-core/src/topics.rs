//! Deterministic topic classification for claims.
//!
//! Resolution outcomes must be reproducible in tests without invoking any
//! external capability, so classification is an ordered keyword table, not
//! model inference. The same text always yields the same topic set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed category set used for source registry lookups and reviewer
/// expertise matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Technology,
    Finance,
    Sports,
    Health,
    Politics,
    Science,
    General,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Technology => "Technology",
            Topic::Finance => "Finance",
            Topic::Sports => "Sports",
            Topic::Health => "Health",
            Topic::Politics => "Politics",
            Topic::Science => "Science",
            Topic::General => "General",
        }
    }

    /// Parse a topic name case-insensitively (used for expertise tags in
    /// roster config). Unknown tags map to `General` rather than failing.
    pub fn parse(s: &str) -> Topic {
        match s.trim().to_lowercase().as_str() {
            "technology" | "tech" => Topic::Technology,
            "finance" | "business" | "economy" => Topic::Finance,
            "sports" | "sport" => Topic::Sports,
            "health" | "medicine" => Topic::Health,
            "politics" | "government" => Topic::Politics,
            "science" | "research" => Topic::Science,
            _ => Topic::General,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keyword table. First column wins ties on insertion order so the
/// output vector is stable for identical input.
const KEYWORD_RULES: &[(Topic, &[&str])] = &[
    (
        Topic::Technology,
        &["tech", "ai ", "software", "app ", "startup", "computer", "internet", "chip"],
    ),
    (
        Topic::Finance,
        &["market", "stock", "finance", "economy", "bank", "inflation", "currency", "crypto"],
    ),
    (
        Topic::Sports,
        &["cricket", "sports", "ipl", "football", "olympic", "tournament", "match", "league"],
    ),
    (
        Topic::Health,
        &["health", "vaccine", "disease", "covid", "hospital", "drug", "medical", "virus"],
    ),
    (
        Topic::Politics,
        &["election", "government", "minister", "president", "parliament", "senate", "policy"],
    ),
    (
        Topic::Science,
        &["climate", "space", "nasa", "research", "study", "physics", "satellite", "earth"],
    ),
];

/// Classify claim text into one or more topics.
///
/// Matching is case-insensitive substring search over the ordered rule
/// table. Falls back to `[General]` when nothing matches so registry
/// lookups always have a bucket to land in.
pub fn classify(text: &str) -> Vec<Topic> {
    let lower = text.to_lowercase();
    let mut topics = Vec::new();

    for (topic, keywords) in KEYWORD_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            topics.push(*topic);
        }
    }

    if topics.is_empty() {
        topics.push(Topic::General);
    }
    topics
}
