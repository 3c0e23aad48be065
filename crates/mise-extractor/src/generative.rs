//! Generative-completion fallback strategy

use crate::config::ExtractorConfig;
use crate::error::FallbackError;
use crate::locale::Locale;
use crate::parser::{parse_completion, GenerativeRecipe};
use crate::prompt::{PromptBuilder, RECIPE_SCHEMA};
use mise_domain::traits::CompletionProvider;
use mise_domain::{Confidence, FieldName, ParseCandidate, Segment, StrategyId};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Attempts per segment: the first call plus one retry
const MAX_ATTEMPTS: u32 = 2;

/// Placeholder provider for an extractor running without a fallback
#[derive(Debug, Clone, Copy)]
pub enum NoProvider {}

impl CompletionProvider for NoProvider {
    type Error = Infallible;

    fn complete(&self, _prompt: &str) -> Result<String, Self::Error> {
        match *self {}
    }

    fn complete_structured(&self, _prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        match *self {}
    }
}

/// Asks a completion provider for the fields local strategies were unsure of
///
/// Calls share a semaphore sized by `max_concurrent_completions`, each one
/// bounded by the configured timeout. A failed segment gets one retry and
/// then no candidates at all.
pub struct GenerativeFallback<P> {
    provider: Arc<P>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    confidence: Confidence,
    locale: Locale,
}

impl<P> GenerativeFallback<P>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: Display,
{
    /// Create a fallback around a provider
    pub fn new(provider: Arc<P>, config: &ExtractorConfig) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(config.max_concurrent_completions.max(1))),
            timeout: config.generative_timeout(),
            confidence: Confidence::new(config.generative_confidence),
            locale: config.locale,
        }
    }

    /// Request values for `fields` of one segment
    ///
    /// Only the requested fields are taken from the answer. A requested
    /// field the answer leaves empty gets a not-found candidate.
    pub async fn complete(
        &self,
        segment: &Segment,
        fields: &[FieldName],
    ) -> Result<Vec<ParseCandidate>, FallbackError> {
        let prompt = PromptBuilder::new(&segment.raw_text, fields, self.locale).build();
        debug!(
            "Segment {}: fallback prompt {} chars for {:?}",
            segment.index,
            prompt.len(),
            fields
        );

        let mut attempt = 1;
        let recipe = loop {
            match self.attempt(prompt.clone()).await {
                Ok(recipe) => break recipe,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Segment {}: fallback attempt {} failed, retrying: {}",
                        segment.index, attempt, e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Segment {}: fallback gave up after {} attempts: {}",
                        segment.index, attempt, e
                    );
                    return Err(e);
                }
            }
        };

        Ok(fields
            .iter()
            .map(|&field| match recipe.value(field, self.confidence) {
                Some(value) => ParseCandidate::found(
                    segment.index,
                    StrategyId::Generative,
                    field,
                    value,
                    self.confidence,
                ),
                None => ParseCandidate::not_found(segment.index, StrategyId::Generative, field),
            })
            .collect())
    }

    async fn attempt(&self, prompt: String) -> Result<GenerativeRecipe, FallbackError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| FallbackError::Provider(format!("worker pool closed: {}", e)))?;

        let provider = Arc::clone(&self.provider);
        // CompletionProvider is sync; keep it off the async workers. The
        // permit lives as long as the call, not the timeout.
        let call = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            provider
                .complete_structured(&prompt, RECIPE_SCHEMA)
                .map_err(|e| FallbackError::Provider(e.to_string()))
        });

        let response = timeout(self.timeout, call)
            .await
            .map_err(|_| FallbackError::Timeout(self.timeout))?
            .map_err(|e| FallbackError::Provider(format!("Task join error: {}", e)))??;

        parse_completion(&response)
    }
}
