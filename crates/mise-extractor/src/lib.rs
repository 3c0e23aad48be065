//! Mise Extractor
//!
//! Turns cookbook text into structured recipe drafts and feeds reviewer
//! corrections back into the learning log.
//!
//! # Architecture
//!
//! ```text
//! Document → Segmenter → Segments → Strategy Chain → Confidence Merger → Drafts
//!                                    (pattern, heuristic, generative)
//! Drafts → review → CorrectionRecorder → TrainingLog → (Pattern Miner)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use mise_extractor::{Extractor, ExtractorConfig, PatternLibrary, SourceDocument};
//! use mise_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let library = Arc::new(PatternLibrary::empty());
//! let extractor = Extractor::new(ExtractorConfig::default(), library)
//!     .with_provider(MockProvider::default());
//!
//! let document = extractor
//!     .parse_document(SourceDocument::new("Pfannkuchen\n4 Personen\n200 g Mehl\n1. Mehl sieben"))
//!     .await?;
//!
//! for draft in document.drafts() {
//!     println!("{:?}: {:?}", draft.title, draft.overall_state);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
pub mod fingerprint;
mod generative;
mod heuristic;
mod library;
pub mod lines;
mod locale;
mod merger;
mod parser;
mod pattern;
mod prompt;
mod recorder;
mod segmenter;
mod strategy;
mod types;


pub use config::{ExtractorConfig, HeuristicConfidences};
pub use error::{
    ExtractorError, FallbackError, LearningPersistenceError, PatternMatchMiss, SegmentationError,
};
pub use extractor::Extractor;
pub use generative::{GenerativeFallback, NoProvider};
pub use heuristic::{HeuristicV1, HeuristicV2};
pub use library::PatternLibrary;
pub use locale::{normalize_token, Locale, Vocabulary};
pub use merger::{best_candidate, best_confidence, ConfidenceMerger};
pub use parser::{parse_completion, GenerativeIngredient, GenerativeRecipe};
pub use pattern::{apply_rule, PatternStrategy, RuleApplication};
pub use prompt::{PromptBuilder, RECIPE_SCHEMA};
pub use recorder::{CorrectionRecorder, CorrectionReport};
pub use segmenter::Segmenter;
pub use strategy::{heuristic_by_name, heuristic_strategy, FieldFindings, ParseContext, Strategy};
pub use types::{ParsedDocument, ParsedSegment, SourceDocument};
