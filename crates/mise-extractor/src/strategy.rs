//! The common strategy seam and the field findings strategies build up

use crate::config::HeuristicConfidences;
use crate::heuristic::{HeuristicV1, HeuristicV2};
use crate::locale::Locale;
use mise_domain::{
    Confidence, FieldName, FieldValue, Fingerprint, HeuristicVersion, IngredientEntry,
    ParseCandidate, PatternLibraryVersion, Segment, StepEntry, StrategyId,
};

/// What a local strategy may look at while parsing one segment
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Fingerprint of the source document
    pub fingerprint: &'a Fingerprint,
    /// Library snapshot bound for the whole parse
    pub library: &'a PatternLibraryVersion,
    /// Vocabulary in use
    pub locale: Locale,
}

/// A local parsing strategy
///
/// Implementations are deterministic: the same segment and context always
/// yield the same candidates. Every attempted field gets a candidate,
/// `value: None` when nothing was found.
pub trait Strategy: Send + Sync {
    /// Identifier used for attribution and tie-breaks
    fn id(&self) -> StrategyId;

    /// Produce field candidates for one segment
    fn parse(&self, segment: &Segment, ctx: &ParseContext<'_>) -> Vec<ParseCandidate>;
}

/// Heuristic parser generation selected by configuration
pub fn heuristic_strategy(
    version: HeuristicVersion,
    confidences: HeuristicConfidences,
) -> Box<dyn Strategy> {
    match version {
        HeuristicVersion::V1 => Box::new(HeuristicV1::new(confidences)),
        HeuristicVersion::V2 => Box::new(HeuristicV2::new(confidences)),
    }
}

/// Heuristic parser generation by its stable name ("heuristic-v1", "v2", ...)
pub fn heuristic_by_name(
    name: &str,
    confidences: HeuristicConfidences,
) -> Option<Box<dyn Strategy>> {
    let version = match name.trim().to_lowercase().as_str() {
        "heuristic-v1" | "v1" => HeuristicVersion::V1,
        "heuristic-v2" | "v2" => HeuristicVersion::V2,
        _ => return None,
    };
    Some(heuristic_strategy(version, confidences))
}

/// Values a strategy found in one segment, each with its own confidence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFindings {
    /// Title text
    pub title: Option<(String, Confidence)>,
    /// Servings count
    pub servings: Option<(u32, Confidence)>,
    /// Preparation minutes
    pub prep_time: Option<(u32, Confidence)>,
    /// Cooking minutes
    pub cook_time: Option<(u32, Confidence)>,
    /// Ingredients in order
    pub ingredients: Vec<IngredientEntry>,
    /// Steps in order
    pub steps: Vec<StepEntry>,
}

impl FieldFindings {
    /// Append an ingredient
    pub fn push_ingredient(
        &mut self,
        amount: Option<f64>,
        unit: Option<String>,
        name: impl Into<String>,
        confidence: f64,
    ) {
        self.ingredients.push(IngredientEntry {
            amount,
            unit,
            name: name.into(),
            confidence: Confidence::new(confidence),
        });
    }

    /// Append a step
    pub fn push_step(&mut self, text: impl Into<String>, confidence: f64) {
        self.steps.push(StepEntry {
            text: text.into(),
            confidence: Confidence::new(confidence),
        });
    }

    /// Found value and confidence of one field; lists score their entry mean
    pub fn value(&self, field: FieldName) -> Option<(FieldValue, Confidence)> {
        match field {
            FieldName::Title => self
                .title
                .as_ref()
                .filter(|(t, _)| !t.trim().is_empty())
                .map(|(t, c)| (FieldValue::Text(t.clone()), *c)),
            FieldName::Servings => self.servings.map(|(n, c)| (FieldValue::Count(n), c)),
            FieldName::PrepTime => self.prep_time.map(|(m, c)| (FieldValue::Minutes(m), c)),
            FieldName::CookTime => self.cook_time.map(|(m, c)| (FieldValue::Minutes(m), c)),
            FieldName::Ingredients if !self.ingredients.is_empty() => {
                let value = FieldValue::Ingredients(self.ingredients.clone());
                let confidence = value.entry_confidence().unwrap_or(Confidence::NONE);
                Some((value, confidence))
            }
            FieldName::Steps if !self.steps.is_empty() => {
                let value = FieldValue::Steps(self.steps.clone());
                let confidence = value.entry_confidence().unwrap_or(Confidence::NONE);
                Some((value, confidence))
            }
            _ => None,
        }
    }

    /// Multiply every confidence by `factor`
    pub fn scaled_by(mut self, factor: f64) -> Self {
        for (_, c) in self.title.iter_mut() {
            *c = c.scaled_by(factor);
        }
        let scalars = self
            .servings
            .iter_mut()
            .chain(self.prep_time.iter_mut())
            .chain(self.cook_time.iter_mut());
        for (_, c) in scalars {
            *c = c.scaled_by(factor);
        }
        for entry in &mut self.ingredients {
            entry.confidence = entry.confidence.scaled_by(factor);
        }
        for step in &mut self.steps {
            step.confidence = step.confidence.scaled_by(factor);
        }
        self
    }

    /// One candidate per attempted field
    pub fn into_candidates(
        self,
        segment_index: usize,
        strategy: StrategyId,
        attempted: &[FieldName],
    ) -> Vec<ParseCandidate> {
        attempted
            .iter()
            .map(|&field| match self.value(field) {
                Some((value, confidence)) => {
                    ParseCandidate::found(segment_index, strategy, field, value, confidence)
                }
                None => ParseCandidate::not_found(segment_index, strategy, field),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfound_attempted_fields_still_emit() {
        let mut findings = FieldFindings::default();
        findings.servings = Some((4, Confidence::new(0.8)));
        let candidates = findings.into_candidates(
            2,
            StrategyId::Pattern,
            &[FieldName::Servings, FieldName::Steps],
        );
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].value, Some(FieldValue::Count(4)));
        assert_eq!(candidates[1].value, None);
        assert_eq!(candidates[1].confidence, Confidence::NONE);
        assert!(candidates.iter().all(|c| c.segment_index == 2));
    }

    #[test]
    fn test_scaling_reaches_entries() {
        let mut findings = FieldFindings::default();
        findings.push_step("Backen", 1.0);
        findings.title = Some(("Brot".into(), Confidence::CERTAIN));
        let scaled = findings.scaled_by(0.4);
        assert_eq!(scaled.steps[0].confidence, Confidence::new(0.4));
        assert_eq!(scaled.title.unwrap().1, Confidence::new(0.4));
    }

    #[test]
    fn test_heuristic_by_name() {
        let v1 = heuristic_by_name("heuristic-v1", HeuristicConfidences::default()).unwrap();
        assert_eq!(v1.id(), StrategyId::Heuristic(HeuristicVersion::V1));
        assert!(heuristic_by_name("v9", HeuristicConfidences::default()).is_none());
    }
}
