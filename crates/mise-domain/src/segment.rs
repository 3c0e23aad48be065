//! Segments and document fingerprints

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A contiguous span of document text treated as one candidate recipe
///
/// Segments produced from one document are ordered, pairwise disjoint, and
/// together cover every byte of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment within its document
    pub index: usize,

    /// Byte range into the document text
    pub offset_range: Range<usize>,

    /// The text covered by `offset_range`
    pub raw_text: String,

    /// Likely recipe title, when the segment opens with a heading
    pub heading_guess: Option<String>,
}

impl Segment {
    /// A segment spanning an entire standalone text (no document context)
    pub fn standalone(text: impl Into<String>) -> Self {
        let raw_text = text.into();
        Self {
            index: 0,
            offset_range: 0..raw_text.len(),
            raw_text,
            heading_guess: None,
        }
    }

    /// Attach a heading guess
    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading_guess = Some(heading.into());
        self
    }

    /// Non-empty, trimmed lines of the segment
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.raw_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Structural signature of a source document
///
/// Computed from layout cues only, never raw words, so that books from one
/// publisher or layout family land on the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a precomputed fingerprint (e.g. supplied by the document extractor)
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the fingerprint string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
