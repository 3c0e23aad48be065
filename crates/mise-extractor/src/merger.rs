//! Field-level confidence merge

use mise_domain::{Confidence, FieldName, MergedRecipeDraft, ParseCandidate};
use std::cmp::Ordering;

/// Picks, per field, the most trusted candidate across all strategies
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceMerger {
    floor: f64,
}

/// Order two candidates: higher confidence first, then strategy priority
fn rank(a: &ParseCandidate, b: &ParseCandidate) -> Ordering {
    b.confidence
        .value()
        .total_cmp(&a.confidence.value())
        .then_with(|| a.strategy.priority_rank().cmp(&b.strategy.priority_rank()))
}

/// Best candidate with a value for `field`
pub fn best_candidate(candidates: &[ParseCandidate], field: FieldName) -> Option<&ParseCandidate> {
    candidates
        .iter()
        .filter(|c| c.field == field && c.has_value())
        .min_by(|a, b| rank(a, b))
}

/// Highest confidence any candidate reached for `field`; zero when none did
pub fn best_confidence(candidates: &[ParseCandidate], field: FieldName) -> Confidence {
    best_candidate(candidates, field).map_or(Confidence::NONE, |c| c.confidence)
}

impl ConfidenceMerger {
    /// Merger that flags required fields below `floor`
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// Fill `draft` from the winning candidate of every field and assess it
    pub fn merge(
        &self,
        mut draft: MergedRecipeDraft,
        candidates: &[ParseCandidate],
    ) -> MergedRecipeDraft {
        for field in FieldName::ALL {
            match best_candidate(candidates, field) {
                Some(winner) => draft.set_field(
                    field,
                    winner.value.clone(),
                    winner.confidence,
                    Some(winner.strategy),
                ),
                None => draft.set_field(field, None, Confidence::NONE, None),
            }
        }
        draft.assess(self.floor);
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mise_domain::{
        DraftId, DraftState, FieldValue, Fingerprint, HeuristicVersion, StepEntry, StrategyId,
    };

    const HEURISTIC: StrategyId = StrategyId::Heuristic(HeuristicVersion::V2);

    fn text(strategy: StrategyId, field: FieldName, value: &str, c: f64) -> ParseCandidate {
        let value = FieldValue::Text(value.into());
        ParseCandidate::found(0, strategy, field, value, Confidence::new(c))
    }

    fn steps(strategy: StrategyId, c: f64) -> ParseCandidate {
        let value = FieldValue::Steps(vec![StepEntry {
            text: "Backen".into(),
            confidence: Confidence::new(c),
        }]);
        ParseCandidate::found(0, strategy, FieldName::Steps, value, Confidence::new(c))
    }

    fn empty() -> MergedRecipeDraft {
        MergedRecipeDraft::empty(DraftId::new("d"), 0, Fingerprint::new("fp"), 0)
    }

    #[test]
    fn test_highest_confidence_wins_per_field() {
        let candidates = vec![
            text(StrategyId::Pattern, FieldName::Title, "Brot", 0.5),
            text(HEURISTIC, FieldName::Title, "Brotrezept", 0.7),
            steps(StrategyId::Pattern, 0.9),
            steps(StrategyId::Generative, 0.6),
        ];
        let draft = ConfidenceMerger::new(0.5).merge(empty(), &candidates);
        assert_eq!(draft.title.as_ref().unwrap().value, "Brotrezept");
        assert_eq!(draft.sources.get(&FieldName::Title), Some(&HEURISTIC));
        assert_eq!(draft.sources.get(&FieldName::Steps), Some(&StrategyId::Pattern));
    }

    #[test]
    fn test_ties_follow_strategy_priority() {
        let candidates = vec![
            text(StrategyId::Generative, FieldName::Title, "C", 0.7),
            text(HEURISTIC, FieldName::Title, "B", 0.7),
            text(StrategyId::Pattern, FieldName::Title, "A", 0.7),
        ];
        let best = best_candidate(&candidates, FieldName::Title).unwrap();
        assert_eq!(best.strategy, StrategyId::Pattern);
    }

    #[test]
    fn test_not_found_candidates_never_win() {
        let candidates =
            vec![ParseCandidate::not_found(0, StrategyId::Pattern, FieldName::Servings)];
        assert_eq!(best_confidence(&candidates, FieldName::Servings), Confidence::NONE);
        let draft = ConfidenceMerger::new(0.5).merge(empty(), &candidates);
        assert!(draft.servings.is_none());
        assert_eq!(draft.overall_state, DraftState::Incomplete);
    }
}
