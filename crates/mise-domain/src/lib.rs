//! Mise Domain Layer
//!
//! Core data model for the recipe extraction and learning pipeline. Nothing
//! in this crate performs I/O; it defines the values that flow through the
//! pipeline and the trait seams infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Segment**: a contiguous span of document text, one candidate recipe
//! - **Fingerprint**: structural signature of a source layout family
//! - **ParseCandidate**: one strategy's answer for one field
//! - **MergedRecipeDraft**: the field-by-field winner of all candidates
//! - **TrainingExample**: an immutable record of a human correction
//! - **PatternRule**: a learned, fingerprint-scoped rule with a success rate
//! - **PatternLibraryVersion**: an immutable, numbered set of rules

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod confidence;
pub mod ids;
pub mod lifecycle;
pub mod pattern;
pub mod recipe;
pub mod segment;
pub mod training;
pub mod traits;

// Re-exports for convenience
pub use candidate::{
    FieldName, FieldValue, HeuristicVersion, IngredientEntry, ParseCandidate, StepEntry,
    StrategyId,
};
pub use confidence::Confidence;
pub use ids::{DocumentId, DraftId};
pub use lifecycle::{DocumentState, InvalidTransition};
pub use pattern::{IngredientOrder, PatternLibraryVersion, PatternRule, RuleDefinition, StepStyle};
pub use recipe::{DraftField, DraftState, MergedRecipeDraft};
pub use segment::{Fingerprint, Segment};
pub use training::{Correction, DraftDiff, FieldChange, NewTrainingExample, TrainingExample};
