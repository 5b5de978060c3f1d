//! Credible source registry.
//!
//! Static topic -> trusted-domain mapping, loaded once at startup and
//! read-only for the engine's lifetime. Config can override or extend the
//! built-in table per topic; lookups fall back to `General` so resolution
//! always has somewhere to ask.

use crate::topics::Topic;
use std::collections::HashMap;
use tracing::info;

const BUILTIN_SOURCES: &[(Topic, &[&str])] = &[
    (
        Topic::Technology,
        &["techcrunch.com", "arstechnica.com", "theverge.com"],
    ),
    (
        Topic::Finance,
        &["reuters.com", "bloomberg.com", "ft.com"],
    ),
    (
        Topic::Sports,
        &["espn.com", "bbc.com/sport", "cricbuzz.com"],
    ),
    (
        Topic::Health,
        &["who.int", "cdc.gov", "nih.gov"],
    ),
    (
        Topic::Politics,
        &["reuters.com", "apnews.com", "bbc.com/news"],
    ),
    (
        Topic::Science,
        &["nasa.gov", "nature.com", "science.org"],
    ),
    (
        Topic::General,
        &["reuters.com", "apnews.com", "snopes.com"],
    ),
];

/// Read-only registry handed to the resolution procedure at startup.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: HashMap<Topic, Vec<String>>,
}

impl SourceRegistry {
    /// Built-in registry with no overrides.
    pub fn builtin() -> Self {
        let sources = BUILTIN_SOURCES
            .iter()
            .map(|(topic, domains)| {
                (*topic, domains.iter().map(|d| d.to_string()).collect())
            })
            .collect();
        Self { sources }
    }

    /// Built-in registry with per-topic overrides from config. An override
    /// replaces the topic's list wholesale; unknown topic names are folded
    /// into `General` by `Topic::parse`.
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Self {
        let mut registry = Self::builtin();
        for (name, domains) in overrides {
            let topic = Topic::parse(name);
            registry.sources.insert(topic, domains.clone());
        }
        info!(
            "Source registry loaded: {} topics, {} overrides",
            registry.sources.len(),
            overrides.len()
        );
        registry
    }

    /// Ordered, deduplicated domain list for a claim's topic set.
    /// Falls back to the `General` bucket when the topics yield nothing.
    pub fn domains_for(&self, topics: &[Topic]) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for topic in topics {
            if let Some(list) = self.sources.get(topic) {
                for domain in list {
                    if !domains.contains(domain) {
                        domains.push(domain.clone());
                    }
                }
            }
        }
        if domains.is_empty() {
            if let Some(list) = self.sources.get(&Topic::General) {
                domains.extend(list.iter().cloned());
            }
        }
        domains
    }
}
