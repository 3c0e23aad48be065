//! Document lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a document is in the extraction and review workflow
///
/// Documents move forward only:
/// - Uploaded -> Segmented -> Parsed -> ReviewPending | Committed
/// - ReviewPending -> Corrected -> Archived
/// - Uploaded -> Failed when segmentation rejects the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Received, not yet split
    Uploaded,
    /// Split into segments
    Segmented,
    /// Every segment has a merged draft
    Parsed,
    /// At least one draft needs a human
    ReviewPending,
    /// All drafts complete, handed to recipe storage
    Committed,
    /// Reviewer corrections accepted, awaiting the learning log
    Corrected,
    /// Corrections logged
    Archived,
    /// Segmentation failed
    Failed,
}

/// A transition the lifecycle does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    /// State the document was in
    pub from: DocumentState,
    /// State that was requested
    pub to: DocumentState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move document from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

impl DocumentState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Uploaded => "uploaded",
            DocumentState::Segmented => "segmented",
            DocumentState::Parsed => "parsed",
            DocumentState::ReviewPending => "review_pending",
            DocumentState::Committed => "committed",
            DocumentState::Corrected => "corrected",
            DocumentState::Archived => "archived",
            DocumentState::Failed => "failed",
        }
    }

    /// Parse a state from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uploaded" => Some(DocumentState::Uploaded),
            "segmented" => Some(DocumentState::Segmented),
            "parsed" => Some(DocumentState::Parsed),
            "review_pending" => Some(DocumentState::ReviewPending),
            "committed" => Some(DocumentState::Committed),
            "corrected" => Some(DocumentState::Corrected),
            "archived" => Some(DocumentState::Archived),
            "failed" => Some(DocumentState::Failed),
            _ => None,
        }
    }

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentState::Committed | DocumentState::Archived | DocumentState::Failed
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Uploaded, Segmented)
                | (Uploaded, Failed)
                | (Segmented, Parsed)
                | (Parsed, ReviewPending)
                | (Parsed, Committed)
                | (ReviewPending, Corrected)
                | (Corrected, Archived)
        )
    }

    /// Move to `next`, or report why that is not allowed
    pub fn transition(self, next: DocumentState) -> Result<DocumentState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document state: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_path() {
        let state = DocumentState::Uploaded
            .transition(DocumentState::Segmented)
            .and_then(|s| s.transition(DocumentState::Parsed))
            .and_then(|s| s.transition(DocumentState::ReviewPending))
            .and_then(|s| s.transition(DocumentState::Corrected))
            .and_then(|s| s.transition(DocumentState::Archived))
            .unwrap();
        assert_eq!(state, DocumentState::Archived);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_segmentation_failure_is_terminal() {
        let failed = DocumentState::Uploaded.transition(DocumentState::Failed).unwrap();
        assert!(failed.is_terminal());
        assert!(failed.transition(DocumentState::Segmented).is_err());
    }

    #[test]
    fn test_corrected_cannot_skip_to_committed() {
        let err = DocumentState::Corrected
            .transition(DocumentState::Committed)
            .unwrap_err();
        assert_eq!(err.from, DocumentState::Corrected);
        assert_eq!(err.to.as_str(), "committed");
    }

    #[test]
    fn test_committed_accepts_nothing() {
        assert!(!DocumentState::Committed.can_transition_to(DocumentState::Corrected));
        assert!(!DocumentState::Parsed.can_transition_to(DocumentState::Failed));
    }

    #[test]
    fn test_parse_round_trip() {
        for state in [
            DocumentState::Uploaded,
            DocumentState::ReviewPending,
            DocumentState::Archived,
        ] {
            assert_eq!(state.as_str().parse::<DocumentState>(), Ok(state));
        }
    }
}
