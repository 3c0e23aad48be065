//! Fixed-rule heuristic parsers
//!
//! Both generations always run, whatever the pattern library holds, so
//! every segment gets at least one candidate. Each rule type carries a
//! fixed confidence from [`HeuristicConfidences`].

use crate::config::HeuristicConfidences;
use crate::lines::{
    bullet_item, heading_text, ingredient_amount_first, is_imperative, is_prose, marked_duration,
    ordinal_step, section_heading, servings, ParsedIngredient, Section,
};
use crate::locale::Vocabulary;
use crate::strategy::{FieldFindings, ParseContext, Strategy};
use mise_domain::{Confidence, FieldName, HeuristicVersion, ParseCandidate, Segment, StrategyId};

const V1_FIELDS: [FieldName; 4] = [
    FieldName::Title,
    FieldName::Servings,
    FieldName::Ingredients,
    FieldName::Steps,
];

fn strip_heading(line: &str) -> &str {
    heading_text(line).unwrap_or(line)
}

fn push_parsed(findings: &mut FieldFindings, parsed: ParsedIngredient, c: &HeuristicConfidences) {
    let confidence = if parsed.unit.is_some() {
        c.ingredient_with_unit
    } else {
        c.ingredient_without_unit
    };
    findings.push_ingredient(parsed.amount, parsed.unit, parsed.name, confidence);
}

/// First generation: first-line title, quantity lines, ordinal steps
#[derive(Debug, Clone, Default)]
pub struct HeuristicV1 {
    confidences: HeuristicConfidences,
}

impl HeuristicV1 {
    /// Create with the given rule confidences
    pub fn new(confidences: HeuristicConfidences) -> Self {
        Self { confidences }
    }

    fn findings(&self, segment: &Segment, vocab: &Vocabulary) -> FieldFindings {
        let c = &self.confidences;
        let mut findings = FieldFindings::default();

        for (i, line) in segment.lines().enumerate() {
            if i == 0 {
                let title = strip_heading(line).to_string();
                findings.title = Some((title, Confidence::new(c.title_first_line)));
            }
            if findings.servings.is_none() {
                if let Some(n) = servings(line, vocab.servings_markers) {
                    findings.servings = Some((n, Confidence::new(c.servings)));
                    continue;
                }
            }
            if let Some(text) = ordinal_step(line) {
                findings.push_step(text, c.step_ordinal);
                continue;
            }
            if let Some(parsed) = ingredient_amount_first(line, vocab, &[]) {
                push_parsed(&mut findings, parsed, c);
            }
        }
        findings
    }
}

impl Strategy for HeuristicV1 {
    fn id(&self) -> StrategyId {
        StrategyId::Heuristic(HeuristicVersion::V1)
    }

    fn parse(&self, segment: &Segment, ctx: &ParseContext<'_>) -> Vec<ParseCandidate> {
        self.findings(segment, ctx.locale.vocabulary())
            .into_candidates(segment.index, self.id(), &V1_FIELDS)
    }
}

/// Second generation: sections, times, bullets, imperative and prose steps
#[derive(Debug, Clone, Default)]
pub struct HeuristicV2 {
    confidences: HeuristicConfidences,
}

impl HeuristicV2 {
    /// Create with the given rule confidences
    pub fn new(confidences: HeuristicConfidences) -> Self {
        Self { confidences }
    }

    fn findings(&self, segment: &Segment, vocab: &Vocabulary) -> FieldFindings {
        let c = &self.confidences;
        let mut findings = FieldFindings::default();
        let mut section: Option<Section> = None;
        let mut first_plain: Option<&str> = None;
        let mut first_line: Option<&str> = None;

        for (i, line) in segment.lines().enumerate() {
            if i == 0 {
                first_line = Some(line);
                if let Some(heading) = &segment.heading_guess {
                    findings.title = Some((heading.clone(), Confidence::new(c.title_heading)));
                    if strip_heading(line) == heading.as_str() {
                        continue;
                    }
                }
            }

            if let Some(next) = section_heading(line, vocab) {
                section = Some(next);
                if findings.servings.is_none() {
                    findings.servings = servings(line, vocab.servings_markers)
                        .map(|n| (n, Confidence::new(c.servings)));
                }
                continue;
            }
            if heading_text(line).is_some() {
                continue;
            }
            if let Some(text) = ordinal_step(line) {
                findings.push_step(text, c.step_ordinal);
                continue;
            }
            if findings.servings.is_none() {
                if let Some(n) = servings(line, vocab.servings_markers) {
                    findings.servings = Some((n, Confidence::new(c.servings)));
                    continue;
                }
            }
            if findings.prep_time.is_none() {
                if let Some(m) = marked_duration(line, vocab.prep_markers) {
                    findings.prep_time = Some((m, Confidence::new(c.time)));
                    continue;
                }
            }
            if findings.cook_time.is_none() {
                if let Some(m) = marked_duration(line, vocab.cook_markers) {
                    findings.cook_time = Some((m, Confidence::new(c.time)));
                    continue;
                }
            }
            if let Some(item) = bullet_item(line) {
                if section != Some(Section::Steps) {
                    if let Some(parsed) = ingredient_amount_first(item, vocab, &[]) {
                        push_parsed(&mut findings, parsed, c);
                        continue;
                    }
                }
                if section == Some(Section::Ingredients) {
                    findings.push_ingredient(None, None, item, c.ingredient_in_section);
                } else {
                    findings.push_step(item, c.step_bullet);
                }
                continue;
            }
            if section != Some(Section::Steps) {
                if let Some(parsed) = ingredient_amount_first(line, vocab, &[]) {
                    push_parsed(&mut findings, parsed, c);
                    continue;
                }
            }
            if section == Some(Section::Ingredients) && !is_prose(line) {
                findings.push_ingredient(None, None, line, c.ingredient_in_section);
                continue;
            }
            if is_imperative(line, vocab) {
                findings.push_step(line, c.step_imperative);
                continue;
            }
            if is_prose(line) {
                findings.push_step(line, c.step_prose);
                continue;
            }
            if first_plain.is_none()
                && findings.ingredients.is_empty()
                && findings.steps.is_empty()
            {
                first_plain = Some(line);
            }
        }

        if findings.title.is_none() {
            findings.title = match (first_plain, first_line) {
                (Some(line), _) => Some((line.to_string(), Confidence::new(c.title_first_line))),
                (None, Some(line)) => Some((
                    strip_heading(line).to_string(),
                    Confidence::new(c.title_fallback),
                )),
                (None, None) => None,
            };
        }
        findings
    }
}

impl Strategy for HeuristicV2 {
    fn id(&self) -> StrategyId {
        StrategyId::Heuristic(HeuristicVersion::V2)
    }

    fn parse(&self, segment: &Segment, ctx: &ParseContext<'_>) -> Vec<ParseCandidate> {
        self.findings(segment, ctx.locale.vocabulary())
            .into_candidates(segment.index, self.id(), &FieldName::ALL)
    }
}
