//! Input and output types for a document parse

use mise_domain::{
    DocumentId, DocumentState, DraftId, FieldName, Fingerprint, MergedRecipeDraft,
    ParseCandidate, Segment,
};
use serde::{Deserialize, Serialize};

/// Text handed over by the upstream document extractor
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Identifier of the uploaded document
    pub document_id: DocumentId,

    /// UTF-8 text with layout markers
    pub text: String,

    /// Strictly increasing byte offsets where a new recipe starts
    pub boundary_hints: Vec<usize>,

    /// Structural signature computed upstream; derived from the text when absent
    pub fingerprint: Option<Fingerprint>,
}

impl SourceDocument {
    /// A fresh document with no hints or fingerprint
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            document_id: DocumentId::new(),
            text: text.into(),
            boundary_hints: Vec::new(),
            fingerprint: None,
        }
    }

    /// Attach boundary hints
    pub fn with_hints(mut self, hints: Vec<usize>) -> Self {
        self.boundary_hints = hints;
        self
    }

    /// Attach an upstream fingerprint
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }
}

/// Everything the chain produced for one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSegment {
    /// The segment itself
    pub segment: Segment,

    /// Field-level merge of all candidates
    pub draft: MergedRecipeDraft,

    /// Every candidate from every strategy that ran, in chain order
    pub candidates: Vec<ParseCandidate>,

    /// Fields the generative fallback was asked about
    pub fallback_fields: Vec<FieldName>,

    /// Why the fallback soft-failed, if it did
    pub fallback_error: Option<String>,
}

/// Result of parsing one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Identifier of the source document
    pub document_id: DocumentId,

    /// Fingerprint the parse was keyed on
    pub fingerprint: Fingerprint,

    /// Pattern library version bound for the whole parse
    pub library_version: u64,

    /// Lifecycle state
    pub state: DocumentState,

    /// One entry per segment, in document order
    pub segments: Vec<ParsedSegment>,
}

impl ParsedDocument {
    /// Merged drafts in document order
    pub fn drafts(&self) -> impl Iterator<Item = &MergedRecipeDraft> {
        self.segments.iter().map(|s| &s.draft)
    }

    /// Segment that produced the given draft
    pub fn find_draft(&self, draft_id: &DraftId) -> Option<&ParsedSegment> {
        self.segments.iter().find(|s| &s.draft.draft_id == draft_id)
    }

    /// Whether any draft has fields a reviewer should check
    pub fn needs_review(&self) -> bool {
        self.drafts().any(|d| !d.review_fields.is_empty())
    }
}
