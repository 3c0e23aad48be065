//! Merged recipe drafts

use crate::{
    Confidence, Correction, DraftId, FieldName, FieldValue, Fingerprint, IngredientEntry,
    StepEntry, StrategyId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar draft field with its trust score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftField<T> {
    /// Field content
    pub value: T,
    /// Trust in the content
    pub confidence: Confidence,
}

/// Review state of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    /// Title, ingredients and steps all cleared the confidence floor
    Complete,
    /// Has a title but at least one required field is missing or uncertain
    NeedsReview,
    /// No usable title
    Incomplete,
}

impl DraftState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftState::Complete => "complete",
            DraftState::NeedsReview => "needs_review",
            DraftState::Incomplete => "incomplete",
        }
    }
}

/// One structured recipe produced from one segment
///
/// Every ingredient and step carries its own confidence; nothing falls back
/// to an implicit default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecipeDraft {
    /// Content-derived identifier
    pub draft_id: DraftId,
    /// Segment the draft was parsed from
    pub segment_index: usize,
    /// Fingerprint of the source document
    pub fingerprint: Fingerprint,
    /// Pattern library version the parse was bound to
    pub library_version: u64,
    /// Recipe title
    pub title: Option<DraftField<String>>,
    /// Servings
    pub servings: Option<DraftField<u32>>,
    /// Preparation time in minutes
    pub prep_time: Option<DraftField<u32>>,
    /// Cooking time in minutes
    pub cook_time: Option<DraftField<u32>>,
    /// Ordered ingredients
    pub ingredients: Vec<IngredientEntry>,
    /// Ordered steps
    pub steps: Vec<StepEntry>,
    /// Winning strategy per field; absent for reviewer-supplied fields
    pub sources: BTreeMap<FieldName, StrategyId>,
    /// Fields a reviewer should look at
    pub review_fields: Vec<FieldName>,
    /// Overall review state
    pub overall_state: DraftState,
}

impl MergedRecipeDraft {
    /// An empty draft, flagged incomplete until fields are set and assessed
    pub fn empty(
        draft_id: DraftId,
        segment_index: usize,
        fingerprint: Fingerprint,
        library_version: u64,
    ) -> Self {
        Self {
            draft_id,
            segment_index,
            fingerprint,
            library_version,
            title: None,
            servings: None,
            prep_time: None,
            cook_time: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            sources: BTreeMap::new(),
            review_fields: Vec::new(),
            overall_state: DraftState::Incomplete,
        }
    }

    /// Current content of a field, `None` when empty
    pub fn field_value(&self, field: FieldName) -> Option<FieldValue> {
        match field {
            FieldName::Title => self
                .title
                .as_ref()
                .filter(|t| !t.value.trim().is_empty())
                .map(|t| FieldValue::Text(t.value.clone())),
            FieldName::Servings => self.servings.as_ref().map(|s| FieldValue::Count(s.value)),
            FieldName::PrepTime => self.prep_time.as_ref().map(|t| FieldValue::Minutes(t.value)),
            FieldName::CookTime => self.cook_time.as_ref().map(|t| FieldValue::Minutes(t.value)),
            FieldName::Ingredients if !self.ingredients.is_empty() => {
                Some(FieldValue::Ingredients(self.ingredients.clone()))
            }
            FieldName::Steps if !self.steps.is_empty() => {
                Some(FieldValue::Steps(self.steps.clone()))
            }
            _ => None,
        }
    }

    /// Trust in a field; zero when empty, entry mean for lists
    pub fn field_confidence(&self, field: FieldName) -> Confidence {
        match field {
            FieldName::Title => self.title.as_ref().map_or(Confidence::NONE, |t| t.confidence),
            FieldName::Servings => {
                self.servings.as_ref().map_or(Confidence::NONE, |s| s.confidence)
            }
            FieldName::PrepTime => {
                self.prep_time.as_ref().map_or(Confidence::NONE, |t| t.confidence)
            }
            FieldName::CookTime => {
                self.cook_time.as_ref().map_or(Confidence::NONE, |t| t.confidence)
            }
            FieldName::Ingredients => {
                Confidence::mean(self.ingredients.iter().map(|i| i.confidence))
            }
            FieldName::Steps => Confidence::mean(self.steps.iter().map(|s| s.confidence)),
        }
    }

    /// Set or clear a field
    ///
    /// Scalar fields take `confidence`; list entries keep their own scores.
    /// A value whose kind does not fit the field is ignored.
    pub fn set_field(
        &mut self,
        field: FieldName,
        value: Option<FieldValue>,
        confidence: Confidence,
        strategy: Option<StrategyId>,
    ) {
        if let Some(v) = &value {
            if !v.fits(field) {
                return;
            }
        }

        match (field, value) {
            (FieldName::Title, Some(FieldValue::Text(text))) => {
                self.title = Some(DraftField { value: text.trim().to_string(), confidence });
            }
            (FieldName::Servings, Some(FieldValue::Count(n))) => {
                self.servings = Some(DraftField { value: n, confidence });
            }
            (FieldName::PrepTime, Some(FieldValue::Minutes(m))) => {
                self.prep_time = Some(DraftField { value: m, confidence });
            }
            (FieldName::CookTime, Some(FieldValue::Minutes(m))) => {
                self.cook_time = Some(DraftField { value: m, confidence });
            }
            (FieldName::Ingredients, Some(FieldValue::Ingredients(items))) => {
                self.ingredients = items
            }
            (FieldName::Steps, Some(FieldValue::Steps(steps))) => self.steps = steps,
            (FieldName::Title, _) => self.title = None,
            (FieldName::Servings, _) => self.servings = None,
            (FieldName::PrepTime, _) => self.prep_time = None,
            (FieldName::CookTime, _) => self.cook_time = None,
            (FieldName::Ingredients, _) => self.ingredients.clear(),
            (FieldName::Steps, _) => self.steps.clear(),
        }

        match strategy {
            Some(s) if self.field_value(field).is_some() => {
                self.sources.insert(field, s);
            }
            _ => {
                self.sources.remove(&field);
            }
        }
    }

    /// Recompute `review_fields` and `overall_state` against a confidence floor
    ///
    /// Required fields are flagged when missing or below the floor; optional
    /// fields only when present and below the floor.
    pub fn assess(&mut self, floor: f64) {
        self.review_fields = FieldName::ALL
            .into_iter()
            .filter(|field| {
                let present = self.field_value(*field).is_some();
                let cleared = self.field_confidence(*field).clears(floor);
                if field.is_required() {
                    !present || !cleared
                } else {
                    present && !cleared
                }
            })
            .collect();

        let has_title = self.field_value(FieldName::Title).is_some();
        let required_ok = !self.review_fields.iter().any(FieldName::is_required);

        self.overall_state = if !has_title {
            DraftState::Incomplete
        } else if required_ok {
            DraftState::Complete
        } else {
            DraftState::NeedsReview
        };
    }

    /// Produce the reviewer-corrected draft
    ///
    /// Corrected fields become certain and lose their strategy attribution.
    pub fn apply_correction(&self, correction: &Correction, floor: f64) -> MergedRecipeDraft {
        let mut corrected = self.clone();
        for (field, value) in &correction.corrected_fields {
            let value = value
                .as_ref()
                .map(|v| v.with_entry_confidence(Confidence::CERTAIN));
            corrected.set_field(*field, value, Confidence::CERTAIN, None);
        }
        corrected.assess(floor);
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeuristicVersion;

    const HEURISTIC: StrategyId = StrategyId::Heuristic(HeuristicVersion::V2);

    fn draft() -> MergedRecipeDraft {
        MergedRecipeDraft::empty(DraftId::new("d1"), 0, Fingerprint::new("fp"), 1)
    }

    fn ingredients(c: f64) -> FieldValue {
        FieldValue::Ingredients(vec![IngredientEntry {
            amount: Some(200.0),
            unit: Some("g".into()),
            name: "Mehl".into(),
            confidence: Confidence::new(c),
        }])
    }

    fn steps(c: f64) -> FieldValue {
        FieldValue::Steps(vec![StepEntry {
            text: "Mehl sieben".into(),
            confidence: Confidence::new(c),
        }])
    }

    fn set(d: &mut MergedRecipeDraft, field: FieldName, value: FieldValue, c: f64) {
        d.set_field(field, Some(value), Confidence::new(c), Some(HEURISTIC));
    }

    #[test]
    fn test_empty_draft_is_incomplete() {
        let mut d = draft();
        d.assess(0.5);
        assert_eq!(d.overall_state, DraftState::Incomplete);
        assert!(d.review_fields.contains(&FieldName::Title));
    }

    #[test]
    fn test_complete_when_required_fields_clear_floor() {
        let mut d = draft();
        set(&mut d, FieldName::Title, FieldValue::Text("Brot".into()), 0.7);
        set(&mut d, FieldName::Ingredients, ingredients(0.8), 0.8);
        set(&mut d, FieldName::Steps, steps(0.85), 0.85);
        d.assess(0.5);
        assert_eq!(d.overall_state, DraftState::Complete);
        assert!(d.review_fields.is_empty());
        assert_eq!(d.sources.get(&FieldName::Title), Some(&HEURISTIC));
    }

    #[test]
    fn test_low_confidence_needs_review() {
        let mut d = draft();
        set(&mut d, FieldName::Title, FieldValue::Text("Brot".into()), 0.7);
        set(&mut d, FieldName::Ingredients, ingredients(0.3), 0.3);
        set(&mut d, FieldName::Steps, steps(0.85), 0.85);
        set(&mut d, FieldName::Servings, FieldValue::Count(4), 0.2);
        d.assess(0.5);
        assert_eq!(d.overall_state, DraftState::NeedsReview);
        assert_eq!(d.review_fields, vec![FieldName::Servings, FieldName::Ingredients]);
    }

    #[test]
    fn test_mismatched_value_kind_is_ignored() {
        let mut d = draft();
        set(&mut d, FieldName::Servings, FieldValue::Text("vier".into()), 0.9);
        assert!(d.servings.is_none());
        assert!(d.sources.is_empty());
    }

    #[test]
    fn test_apply_correction_sets_certain_values() {
        let mut d = draft();
        set(&mut d, FieldName::Title, FieldValue::Text("4 Personen".into()), 0.55);
        set(&mut d, FieldName::Ingredients, ingredients(0.8), 0.8);
        d.assess(0.5);

        let mut correction = Correction::new(d.draft_id.clone());
        correction.set(FieldName::Title, FieldValue::Text("Brot".into()));
        correction.set(FieldName::Steps, steps(0.1));

        let corrected = d.apply_correction(&correction, 0.5);
        assert_eq!(corrected.title.as_ref().unwrap().value, "Brot");
        assert_eq!(corrected.title.as_ref().unwrap().confidence, Confidence::CERTAIN);
        assert_eq!(corrected.steps[0].confidence, Confidence::CERTAIN);
        assert!(!corrected.sources.contains_key(&FieldName::Title));
        assert_eq!(corrected.sources.get(&FieldName::Ingredients), Some(&HEURISTIC));
        assert_eq!(corrected.overall_state, DraftState::Complete);
    }
}
