//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Fingerprint, NewTrainingExample, PatternLibraryVersion, TrainingExample};

/// Trait for generative completion providers
///
/// Implemented by the infrastructure layer (mise-llm). Calls are blocking;
/// async callers run them on a blocking thread.
pub trait CompletionProvider {
    /// Error type for completion calls
    type Error;

    /// Free-form text completion
    fn complete(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Completion constrained to a JSON schema
    fn complete_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// Append-only log of training examples
///
/// Implemented by the infrastructure layer (mise-store). There is no update
/// or delete.
pub trait TrainingLog {
    /// Error type for log operations
    type Error;

    /// Append one example and return it with its assigned sequence id
    fn append(&mut self, example: NewTrainingExample) -> Result<TrainingExample, Self::Error>;

    /// All examples with `id > after`, in id order
    fn examples_after(&self, after: u64) -> Result<Vec<TrainingExample>, Self::Error>;

    /// The newest `limit` examples of one fingerprint with `id <= through`,
    /// in id order
    fn examples_for_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        through: u64,
        limit: usize,
    ) -> Result<Vec<TrainingExample>, Self::Error> {
        let mut matching: Vec<TrainingExample> = self
            .examples_after(0)?
            .into_iter()
            .filter(|e| e.id <= through && e.fingerprint() == fingerprint)
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.drain(..skip);
        Ok(matching)
    }
}

/// Persistence for published pattern library versions
///
/// Implemented by the infrastructure layer (mise-store)
pub trait PatternRuleStore {
    /// Error type for store operations
    type Error;

    /// Persist a complete version; versions are never overwritten
    fn save_version(&mut self, library: &PatternLibraryVersion) -> Result<(), Self::Error>;

    /// Newest persisted version, or the empty version 0
    fn load_latest(&self) -> Result<PatternLibraryVersion, Self::Error>;
}
