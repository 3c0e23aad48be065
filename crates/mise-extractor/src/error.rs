//! Error types for the Extractor

use mise_domain::InvalidTransition;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a document parse
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The document could not be split into recipes
    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),

    /// Text exceeds maximum length
    #[error("Text too long: {0} bytes (max: {1})")]
    TextTooLong(usize, usize),

    /// The parse was cancelled by the caller
    #[error("Parse cancelled")]
    Cancelled,

    /// A lifecycle transition was requested out of order
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] InvalidTransition),

    /// A correction referenced a draft the document does not contain
    #[error("Unknown draft: {0}")]
    UnknownDraft(String),

    /// A segment worker panicked or was aborted
    #[error("Segment worker failed: {0}")]
    Worker(String),
}

/// Unsupported input; reported to the caller and never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    /// Empty or whitespace-only text
    #[error("document is empty")]
    Empty,

    /// No hint, marker, heading or gap separates recipes
    #[error("document has no recognizable recipe boundary")]
    NoBoundary,

    /// A boundary hint from the document extractor is unusable
    #[error("invalid boundary hint at offset {offset}: {reason}")]
    InvalidHint {
        /// Offending byte offset
        offset: usize,
        /// What is wrong with it
        reason: String,
    },
}

/// Failure of one generative fallback call; never fatal for the document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FallbackError {
    /// The provider did not answer within the per-call timeout
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    /// The response did not validate against the recipe schema
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
}

/// A correction that could not be written to the learning log
///
/// Learning is best-effort: this is logged and the correction dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("learning log append failed after {attempts} attempts: {message}")]
pub struct LearningPersistenceError {
    /// Attempts made, including the first
    pub attempts: u32,
    /// Last underlying error
    pub message: String,
}

/// A pattern rule found nothing it expected in the segment
///
/// Non-fatal: the chain falls through to the heuristic strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("pattern rule {rule_id} matched no structural cue")]
pub struct PatternMatchMiss {
    /// Rule that missed
    pub rule_id: u64,
}
