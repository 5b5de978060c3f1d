//! External capability seams.
//!
//! The answer-generation agent and the trusted-source search are external
//! collaborators: the engine only sees these traits. The in-process
//! implementations here are deterministic so the full lifecycle can run
//! in tests and local installs without any network capability.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};
use veriverse_core::config::AnswerConfig;
use veriverse_core::error::{EngineError, Result};
use veriverse_core::model::EvidenceItem;

/// Output of the answer-generation capability.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub answer_text: String,
    pub seed_confidence: f64,
    pub evidence: Vec<EvidenceItem>,
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer>;
}

/// What one trusted domain says about a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSignal {
    Corroborates,
    Contradicts,
    Silent,
}

#[async_trait]
pub trait SourceQuery: Send + Sync {
    async fn query_domain(&self, domain: &str, claim_text: &str) -> Result<SourceSignal>;
}

/// Call the answer generator with a per-attempt timeout and bounded
/// retries with doubling backoff. After the retry budget is spent the
/// caller transitions the claim to `failed`; nothing retries forever.
pub async fn generate_with_retry(
    generator: &dyn AnswerGenerator,
    prompt: &str,
    config: &AnswerConfig,
) -> Result<GeneratedAnswer> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut last_err = EngineError::CapabilityError("no attempts made".to_string());

    for attempt in 0..=config.max_retries {
        match tokio::time::timeout(timeout, generator.generate(prompt)).await {
            Ok(Ok(answer)) => return Ok(answer),
            Ok(Err(e)) => {
                warn!("Answer generation attempt {} failed: {}", attempt + 1, e);
                last_err = e;
            }
            Err(_) => {
                warn!("Answer generation attempt {} timed out", attempt + 1);
                last_err =
                    EngineError::CapabilityTimeout("answer generation".to_string());
            }
        }

        if attempt < config.max_retries {
            let base = config.retry_backoff_ms.saturating_mul(1 << attempt);
            let jitter = rand::thread_rng().gen_range(0..=base / 4 + 1);
            tokio::time::sleep(Duration::from_millis(base + jitter)).await;
        }
    }

    Err(last_err)
}

/// Deterministic in-process answer generator.
///
/// Stands in for the language-generation agent: returns a provisional
/// answer picked by a stable hash of the prompt, a fixed seed confidence
/// and a canned evidence trail.
pub struct TemplateAnswerGenerator {
    seed_confidence: f64,
}

const ANSWER_TEMPLATES: &[&str] = &[
    "Based on analysis of multiple sources, this claim appears credible. Cross-referencing shows consistency with verified information.",
    "Investigation reveals mixed evidence. The core assertion requires additional verification from authoritative sources.",
    "This claim is well-supported by recent data. Multiple independent sources confirm the key details.",
];

impl TemplateAnswerGenerator {
    pub fn new(seed_confidence: f64) -> Self {
        Self { seed_confidence }
    }
}

impl Default for TemplateAnswerGenerator {
    fn default() -> Self {
        Self::new(0.7)
    }
}

fn stable_hash(text: &str) -> usize {
    // FNV-1a, so template selection does not depend on the process hasher
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash as usize
}

#[async_trait]
impl AnswerGenerator for TemplateAnswerGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer> {
        let template = ANSWER_TEMPLATES[stable_hash(prompt) % ANSWER_TEMPLATES.len()];
        let now = Utc::now();
        Ok(GeneratedAnswer {
            answer_text: template.to_string(),
            seed_confidence: self.seed_confidence,
            evidence: vec![
                EvidenceItem {
                    tool_name: "web_search".to_string(),
                    content: "Multiple sources reviewed. Key findings align with claim."
                        .to_string(),
                    retrieved_at: now,
                },
                EvidenceItem {
                    tool_name: "web_crawler".to_string(),
                    content: "Verified against primary sources and databases.".to_string(),
                    retrieved_at: now,
                },
            ],
        })
    }
}

const CONFIRMATION_KEYWORDS: &[&str] = &[
    "confirmed",
    "verified",
    "accurate",
    "correct",
    "factual",
    "according to",
    "sources confirm",
    "officials say",
    "is true",
    "has been confirmed",
];

const DENIAL_KEYWORDS: &[&str] = &[
    "false",
    "fake",
    "hoax",
    "misleading",
    "debunked",
    "incorrect",
    "misinformation",
    "disinformation",
    "not true",
];

/// Deterministic source-query implementation.
///
/// Tallies confirmation and denial keyword hits in the claim text itself,
/// the same pattern the moderator applies to search snippets when a real
/// search capability is wired in. Silent unless one side leads by at
/// least two hits.
pub struct KeywordSourceQuery;

fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text.contains(**kw)).count()
}

#[async_trait]
impl SourceQuery for KeywordSourceQuery {
    async fn query_domain(&self, domain: &str, claim_text: &str) -> Result<SourceSignal> {
        let lower = claim_text.to_lowercase();
        let confirmations = keyword_hits(&lower, CONFIRMATION_KEYWORDS);
        let denials = keyword_hits(&lower, DENIAL_KEYWORDS);
        debug!(
            "Source query {}: confirmations={} denials={}",
            domain, confirmations, denials
        );

        let signal = if denials > confirmations && denials >= 2 {
            SourceSignal::Contradicts
        } else if confirmations > denials && confirmations >= 2 {
            SourceSignal::Corroborates
        } else {
            SourceSignal::Silent
        };
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_template_generator_is_deterministic() {
        let generator = TemplateAnswerGenerator::default();
        let a = generator.generate("Is the Earth flat?").await.unwrap();
        let b = generator.generate("Is the Earth flat?").await.unwrap();
        assert_eq!(a.answer_text, b.answer_text);
        assert_eq!(a.seed_confidence, 0.7);
        assert_eq!(a.evidence.len(), 2);
    }

    #[tokio::test]
    async fn test_keyword_query_corroborates() {
        let query = KeywordSourceQuery;
        let signal = query
            .query_domain(
                "reuters.com",
                "Officials say the report is accurate and has been confirmed",
            )
            .await
            .unwrap();
        assert_eq!(signal, SourceSignal::Corroborates);
    }

    #[tokio::test]
    async fn test_keyword_query_contradicts() {
        let query = KeywordSourceQuery;
        let signal = query
            .query_domain("snopes.com", "The viral hoax was debunked as misinformation")
            .await
            .unwrap();
        assert_eq!(signal, SourceSignal::Contradicts);
    }

    #[tokio::test]
    async fn test_keyword_query_silent_without_margin() {
        let query = KeywordSourceQuery;
        let signal = query
            .query_domain("example.org", "The sky is sometimes green at dusk")
            .await
            .unwrap();
        assert_eq!(signal, SourceSignal::Silent);
    }

    #[tokio::test]
    async fn test_generate_with_retry_gives_up_after_budget() {
        struct AlwaysFails;

        #[async_trait]
        impl AnswerGenerator for AlwaysFails {
            async fn generate(&self, _prompt: &str) -> Result<GeneratedAnswer> {
                Err(EngineError::CapabilityError("agent offline".to_string()))
            }
        }

        let config = AnswerConfig {
            timeout_secs: 1,
            max_retries: 2,
            retry_backoff_ms: 1,
        };
        let result = generate_with_retry(&AlwaysFails, "prompt", &config).await;
        assert!(matches!(result, Err(EngineError::CapabilityError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_with_retry_times_out() {
        struct Hangs;

        #[async_trait]
        impl AnswerGenerator for Hangs {
            async fn generate(&self, _prompt: &str) -> Result<GeneratedAnswer> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }

        let config = AnswerConfig {
            timeout_secs: 1,
            max_retries: 0,
            retry_backoff_ms: 1,
        };
        let result = generate_with_retry(&Hangs, "prompt", &config).await;
        assert!(matches!(result, Err(EngineError::CapabilityTimeout(_))));
    }
}
