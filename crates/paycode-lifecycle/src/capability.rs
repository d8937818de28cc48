//! Capability traits for text generation and similarity search.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use paycode_types::{OrganizationId, PayRule, RuleSimilarity};

use crate::error::{GenerationError, GenerationResult};

/// Prompt-in, text-out generation capability.
///
/// Implementations wrap whatever model provider the deployment uses.
/// The lifecycle never parses provider responses itself; it hands the
/// returned text straight to the rule compiler.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationResult<String>;
}

/// Vector-style similarity over previously activated rules, used to
/// seed the code generation prompt with related examples.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn find_similar(
        &self,
        statement: &str,
        organization_id: &OrganizationId,
        limit: usize,
    ) -> GenerationResult<Vec<RuleSimilarity>>;

    /// Index a newly activated rule for future lookups.
    async fn index(&self, rule: &PayRule) -> GenerationResult<()>;
}

// ── Shipped stand-ins ──────────────────────────────────────────────────

/// Scripted generator for development and testing: returns canned
/// responses in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Append another canned response to the script.
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response.into());
        }
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_owned());
        }
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front());
        response.ok_or_else(|| {
            GenerationError::TextGeneration("scripted generator ran out of responses".into())
        })
    }
}

/// Similarity capability that finds nothing and indexes nothing, for
/// deployments without a vector backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarityDisabled;

#[async_trait]
impl SimilaritySearch for SimilarityDisabled {
    async fn find_similar(
        &self,
        _statement: &str,
        _organization_id: &OrganizationId,
        _limit: usize,
    ) -> GenerationResult<Vec<RuleSimilarity>> {
        Ok(Vec::new())
    }

    async fn index(&self, _rule: &PayRule) -> GenerationResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_generator_replays_in_order() {
        let generator = ScriptedGenerator::new(["first", "second"]);
        assert_eq!(generator.generate("p1").await.unwrap(), "first");
        assert_eq!(generator.generate("p2").await.unwrap(), "second");
        assert!(generator.generate("p3").await.is_err());
        assert_eq!(generator.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn disabled_similarity_finds_nothing() {
        let similarity = SimilarityDisabled;
        let hits = similarity
            .find_similar("overtime", &OrganizationId::new("org-1"), 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
