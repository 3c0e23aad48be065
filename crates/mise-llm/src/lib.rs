//! Mise Completion Provider Layer
//!
//! Implementations of the `CompletionProvider` trait from `mise-domain`,
//! used by the generative fallback strategy.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic stub for tests and offline runs
//! - `OllamaProvider`: Local Ollama API integration with JSON mode
//!
//! # Examples
//!
//! ```
//! use mise_llm::MockProvider;
//! use mise_domain::traits::CompletionProvider;
//!
//! let provider = MockProvider::new(r#"{"ingredients":[],"steps":[]}"#);
//! let result = provider.complete("segment text").unwrap();
//! assert!(result.contains("ingredients"));
//! ```

#![warn(missing_docs)]

pub mod ollama;

use mise_domain::traits::CompletionProvider;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during completion calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock completion provider for deterministic testing
///
/// Replies are chosen in this order: queued replies (first in, first out),
/// then exact-prompt responses, then the default response. Clones share
/// their queue, responses and counters.
///
/// # Examples
///
/// ```
/// use mise_llm::MockProvider;
/// use mise_domain::traits::CompletionProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.push_error("provider down");
/// provider.push_response("second");
///
/// assert!(provider.complete("p").is_err());
/// assert_eq!(provider.complete("p").unwrap(), "second");
/// assert_eq!(provider.complete("p").unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep before every reply, to exercise caller timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), response.into());
    }

    /// Queue a reply for the next call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(MockReply::Text(response.into()));
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(MockReply::Error(message.into()));
    }

    /// Get the number of completion calls made
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"ingredients":[],"steps":[]}"#)
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, prompt: &str) -> Result<String, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if let Some(reply) = lock(&self.queue).pop_front() {
            return match reply {
                MockReply::Text(text) => Ok(text),
                MockReply::Error(message) => Err(LlmError::Other(message)),
            };
        }

        if let Some(response) = lock(&self.responses).get(prompt) {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }

    fn complete_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.complete(prompt)
    }
}
