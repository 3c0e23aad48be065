//! Learned pattern rules applied to segments

use crate::error::PatternMatchMiss;
use crate::lines::{
    bullet_item, heading_matches, heading_text, ingredient_amount_first, ingredient_name_first,
    is_prose, is_title_like, marked_duration, ordinal_step, servings, ParsedIngredient, Section,
};
use crate::locale::{Locale, Vocabulary};
use crate::strategy::{FieldFindings, ParseContext, Strategy};
use mise_domain::{
    Confidence, FieldName, IngredientOrder, ParseCandidate, RuleDefinition, Segment, StepStyle,
    StrategyId,
};
use tracing::debug;

const TITLE_MAX_WORDS: usize = 12;

/// Outcome of applying one rule definition to one segment
#[derive(Debug, Clone, PartialEq)]
pub struct RuleApplication {
    /// Matched structural cues over expected cues, in [0, 1]
    pub score: f64,
    /// Fields the definition attempts
    pub attempted: Vec<FieldName>,
    /// Values found, every confidence 1.0 before scaling
    pub findings: FieldFindings,
}

fn step_text(line: &str, style: StepStyle, in_steps: bool) -> Option<&str> {
    match style {
        StepStyle::Numbered => ordinal_step(line),
        StepStyle::Bulleted => bullet_item(line).or_else(|| ordinal_step(line)),
        StepStyle::Paragraph => ordinal_step(line)
            .or_else(|| bullet_item(line))
            .or_else(|| (in_steps || is_prose(line)).then_some(line)),
    }
}

fn parse_ingredient(
    item: &str,
    definition: &RuleDefinition,
    vocab: &Vocabulary,
) -> Option<ParsedIngredient> {
    let extra = &definition.extra_units;
    match definition.ingredient_order {
        IngredientOrder::AmountFirst => ingredient_amount_first(item, vocab, extra),
        IngredientOrder::NameFirst => ingredient_name_first(item, vocab, extra)
            .or_else(|| ingredient_amount_first(item, vocab, extra)),
    }
}

/// Apply a rule definition to a segment
///
/// Pure and deterministic; the miner replays rules through this too.
pub fn apply_rule(
    definition: &RuleDefinition,
    segment: &Segment,
    locale: Locale,
) -> RuleApplication {
    let vocab = locale.vocabulary();
    let lines: Vec<&str> = segment.lines().collect();
    let mut findings = FieldFindings::default();
    let mut attempted = vec![FieldName::Title];
    let mut expected = 3usize;
    let mut matched = 0usize;

    if let Some(line) = lines.get(definition.title_line) {
        let title = heading_text(line).unwrap_or(line);
        findings.title = Some((title.to_string(), Confidence::CERTAIN));
        if heading_text(line).is_some() || is_title_like(line, vocab, TITLE_MAX_WORDS) {
            matched += 1;
        }
    }
    if !definition.servings_markers.is_empty() {
        attempted.push(FieldName::Servings);
        expected += 1;
    }
    if !definition.prep_time_markers.is_empty() {
        attempted.push(FieldName::PrepTime);
        expected += 1;
    }
    if !definition.cook_time_markers.is_empty() {
        attempted.push(FieldName::CookTime);
        expected += 1;
    }
    attempted.extend([FieldName::Ingredients, FieldName::Steps]);
    expected += usize::from(definition.ingredient_heading.is_some());
    expected += usize::from(definition.step_heading.is_some());

    let mut region: Option<Section> = None;
    let (mut saw_ingredient_heading, mut saw_step_heading) = (false, false);

    for (i, line) in lines.iter().copied().enumerate() {
        if i == definition.title_line {
            continue;
        }
        if let Some(heading) = &definition.ingredient_heading {
            if heading_matches(line, heading) {
                region = Some(Section::Ingredients);
                saw_ingredient_heading = true;
                continue;
            }
        }
        if let Some(heading) = &definition.step_heading {
            if heading_matches(line, heading) {
                region = Some(Section::Steps);
                saw_step_heading = true;
                continue;
            }
        }
        if findings.servings.is_none() && !definition.servings_markers.is_empty() {
            if let Some(n) = servings(line, &definition.servings_markers) {
                findings.servings = Some((n, Confidence::CERTAIN));
                continue;
            }
        }
        if findings.prep_time.is_none() && !definition.prep_time_markers.is_empty() {
            if let Some(m) = marked_duration(line, &definition.prep_time_markers) {
                findings.prep_time = Some((m, Confidence::CERTAIN));
                continue;
            }
        }
        if findings.cook_time.is_none() && !definition.cook_time_markers.is_empty() {
            if let Some(m) = marked_duration(line, &definition.cook_time_markers) {
                findings.cook_time = Some((m, Confidence::CERTAIN));
                continue;
            }
        }

        if region == Some(Section::Steps) {
            if let Some(text) = step_text(line, definition.step_style, true) {
                findings.push_step(text, 1.0);
            }
            continue;
        }

        let item = bullet_item(line).unwrap_or(line);
        let ordinal = ordinal_step(line).is_some();
        if !ordinal {
            if let Some(parsed) = parse_ingredient(item, definition, vocab) {
                findings.push_ingredient(parsed.amount, parsed.unit, parsed.name, 1.0);
                continue;
            }
            if region == Some(Section::Ingredients) && !is_prose(item) {
                findings.push_ingredient(None, None, item, 1.0);
                continue;
            }
        }
        if let Some(text) = step_text(line, definition.step_style, false) {
            findings.push_step(text, 1.0);
        }
    }

    matched += [
        findings.servings.is_some(),
        findings.prep_time.is_some(),
        findings.cook_time.is_some(),
        saw_ingredient_heading,
        saw_step_heading,
        !findings.ingredients.is_empty(),
        !findings.steps.is_empty(),
    ]
    .into_iter()
    .filter(|hit| *hit)
    .count();

    RuleApplication {
        score: matched as f64 / expected as f64,
        attempted,
        findings,
    }
}

/// Strategy that applies the best learned rule for the document's fingerprint
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternStrategy;

impl Strategy for PatternStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Pattern
    }

    fn parse(&self, segment: &Segment, ctx: &ParseContext<'_>) -> Vec<ParseCandidate> {
        let Some(rule) = ctx.library.lookup(ctx.fingerprint).into_iter().next() else {
            return Vec::new();
        };

        let application = apply_rule(&rule.rule_definition, segment, ctx.locale);
        if application.score <= 0.0 {
            let miss = PatternMatchMiss { rule_id: rule.id };
            debug!("Segment {}: {}", segment.index, miss);
            return Vec::new();
        }

        let factor = rule.success_rate * application.score;
        debug!(
            "Segment {}: rule {} matched with score {:.2} (confidence {:.2})",
            segment.index, rule.id, application.score, factor
        );
        application
            .findings
            .scaled_by(factor)
            .into_candidates(segment.index, self.id(), &application.attempted)
    }
}
