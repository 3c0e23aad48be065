//! Corrections, diffs and training examples

use crate::{DraftId, FieldName, FieldValue, Fingerprint, MergedRecipeDraft};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reviewer input for one draft
///
/// A `None` value clears the field. Consumed to produce exactly one
/// training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Draft being corrected
    pub draft_id: DraftId,
    /// Reviewer-supplied field values
    #[serde(default)]
    pub corrected_fields: BTreeMap<FieldName, Option<FieldValue>>,
}

impl Correction {
    /// A correction with no fields yet (an approval)
    pub fn new(draft_id: DraftId) -> Self {
        Self {
            draft_id,
            corrected_fields: BTreeMap::new(),
        }
    }

    /// Set a field value
    pub fn set(&mut self, field: FieldName, value: FieldValue) -> &mut Self {
        self.corrected_fields.insert(field, Some(value));
        self
    }

    /// Clear a field
    pub fn clear(&mut self, field: FieldName) -> &mut Self {
        self.corrected_fields.insert(field, None);
        self
    }
}

/// One changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Which field changed
    pub field: FieldName,
    /// Value before review
    pub before: Option<FieldValue>,
    /// Value after review
    pub after: Option<FieldValue>,
}

/// The learning signal of a review: only fields whose content changed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftDiff {
    /// Changed fields in draft order
    pub changes: Vec<FieldChange>,
}

impl DraftDiff {
    /// Diff two drafts field by field, ignoring confidence-only changes
    pub fn between(original: &MergedRecipeDraft, corrected: &MergedRecipeDraft) -> Self {
        let changes = FieldName::ALL
            .into_iter()
            .filter_map(|field| {
                let before = original.field_value(field);
                let after = corrected.field_value(field);
                let unchanged = match (&before, &after) {
                    (Some(a), Some(b)) => a.same_content(b),
                    (None, None) => true,
                    _ => false,
                };
                (!unchanged).then_some(FieldChange { field, before, after })
            })
            .collect();
        Self { changes }
    }

    /// True when the reviewer approved the draft as-is
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Fields that changed
    pub fn fields(&self) -> Vec<FieldName> {
        self.changes.iter().map(|c| c.field).collect()
    }

    /// Whether a specific field changed
    pub fn touches(&self, field: FieldName) -> bool {
        self.changes.iter().any(|c| c.field == field)
    }
}

/// A training example before the log assigns it a sequence number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrainingExample {
    /// Fingerprint of the source document
    pub document_fingerprint: Fingerprint,
    /// Draft the correction applied to
    pub draft_id: DraftId,
    /// Segment text the draft was parsed from, used for rule replay
    pub segment_text: String,
    /// Draft as served to the reviewer
    pub original_draft: MergedRecipeDraft,
    /// Draft after correction
    pub corrected_draft: MergedRecipeDraft,
    /// Authoritative delta, computed once at creation
    pub diff: DraftDiff,
    /// Unix seconds
    pub created_at: u64,
}

impl NewTrainingExample {
    /// Build from a draft and its correction; the diff is computed here and
    /// never re-derived later
    pub fn from_review(
        original: &MergedRecipeDraft,
        corrected: MergedRecipeDraft,
        segment_text: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let diff = DraftDiff::between(original, &corrected);
        Self {
            document_fingerprint: original.fingerprint.clone(),
            draft_id: original.draft_id.clone(),
            segment_text: segment_text.into(),
            original_draft: original.clone(),
            corrected_draft: corrected,
            diff,
            created_at,
        }
    }
}

/// An immutable, logged training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Log sequence number, strictly increasing
    pub id: u64,
    /// Example content
    #[serde(flatten)]
    pub example: NewTrainingExample,
}

impl TrainingExample {
    /// Fingerprint shortcut
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.example.document_fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Confidence, HeuristicVersion, StrategyId};

    fn draft(title: &str, servings: Option<u32>) -> MergedRecipeDraft {
        let mut d = MergedRecipeDraft::empty(DraftId::new("d"), 0, Fingerprint::new("fp"), 1);
        let s = Some(StrategyId::Heuristic(HeuristicVersion::V2));
        let title = FieldValue::Text(title.into());
        d.set_field(FieldName::Title, Some(title), Confidence::new(0.7), s);
        if let Some(n) = servings {
            d.set_field(FieldName::Servings, Some(FieldValue::Count(n)), Confidence::new(0.8), s);
        }
        d
    }

    #[test]
    fn test_diff_only_records_true_deltas() {
        let original = draft("Brot", Some(4));
        let corrected = draft("Brot", Some(6));
        let diff = DraftDiff::between(&original, &corrected);
        assert_eq!(diff.fields(), vec![FieldName::Servings]);
        assert_eq!(diff.changes[0].before, Some(FieldValue::Count(4)));
        assert_eq!(diff.changes[0].after, Some(FieldValue::Count(6)));
    }

    #[test]
    fn test_confidence_only_change_is_not_a_delta() {
        let original = draft("Brot", None);
        let mut corrected = original.clone();
        corrected.title.as_mut().unwrap().confidence = Confidence::CERTAIN;
        assert!(DraftDiff::between(&original, &corrected).is_empty());
    }

    #[test]
    fn test_cleared_field_is_a_delta() {
        let original = draft("Brot", Some(4));
        let corrected = draft("Brot", None);
        let diff = DraftDiff::between(&original, &corrected);
        assert!(diff.touches(FieldName::Servings));
        assert_eq!(diff.changes[0].after, None);
    }

    #[test]
    fn test_new_example_computes_diff_once() {
        let original = draft("4 Personen", None);
        let corrected = draft("Brot", None);
        let example = NewTrainingExample::from_review(&original, corrected, "4 Personen\n", 10);
        assert_eq!(example.diff.fields(), vec![FieldName::Title]);
        assert_eq!(example.document_fingerprint, Fingerprint::new("fp"));
        assert_eq!(example.created_at, 10);
    }

    #[test]
    fn test_correction_json_allows_null_to_clear() {
        let json = r#"{"draft_id":"d","corrected_fields":{"servings":null,"title":{"kind":"text","value":"Brot"}}}"#;
        let correction: Correction = serde_json::from_str(json).unwrap();
        assert_eq!(correction.corrected_fields.get(&FieldName::Servings), Some(&None));
        assert_eq!(
            correction.corrected_fields.get(&FieldName::Title),
            Some(&Some(FieldValue::Text("Brot".into())))
        );
    }
}
