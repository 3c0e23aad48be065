//! Rule definitions derived from corrected drafts
//!
//! A corrected draft says what the segment should have produced; derivation
//! works backwards from those values to the lines and words that carry them.

use mise_domain::{IngredientOrder, MergedRecipeDraft, RuleDefinition, StepStyle, TrainingExample};
use mise_extractor::lines::{
    bullet_item, duration_minutes, first_integer, heading_text, normalize_heading, ordinal_step,
    starts_with_amount, words,
};
use mise_extractor::{Locale, Vocabulary};

const DURATION_WORDS: &[&str] = &[
    "stunden", "stunde", "std", "hours", "hour", "hrs", "hr", "h", "minuten", "minute", "minutes",
    "mins", "min", "ca", "etwa", "about",
];

const MAX_HEADING_WORDS: usize = 5;

/// Derive the rule definition that would have produced an example's
/// corrected draft from its segment text
pub fn derive_definition(example: &TrainingExample, locale: Locale) -> RuleDefinition {
    let vocab = locale.vocabulary();
    let draft = &example.example.corrected_draft;
    let lines: Vec<&str> = example
        .example
        .segment_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let title_line = title_line(&lines, draft).unwrap_or(0);
    let mut definition = RuleDefinition {
        title_line,
        ..Default::default()
    };

    if let Some(servings) = &draft.servings {
        let marker = lines
            .iter()
            .find(|line| first_integer(line) == Some(servings.value))
            .and_then(|line| word_next_to(line, servings.value));
        definition.servings_markers.extend(marker);
    }

    let mut prep_line = None;
    if let Some(prep) = &draft.prep_time {
        prep_line = lines.iter().position(|line| duration_minutes(line) == Some(prep.value));
        definition
            .prep_time_markers
            .extend(prep_line.and_then(|i| time_marker(lines[i], vocab)));
    }
    if let Some(cook) = &draft.cook_time {
        let cook_line = lines
            .iter()
            .enumerate()
            .position(|(i, line)| {
                Some(i) != prep_line && duration_minutes(line) == Some(cook.value)
            });
        definition
            .cook_time_markers
            .extend(cook_line.and_then(|i| time_marker(lines[i], vocab)));
    }

    if let Some(first) = draft.ingredients.first() {
        let name = first.name.to_lowercase();
        let found = lines.iter().enumerate().position(|(i, line)| {
            i != title_line && ordinal_step(line).is_none() && line.to_lowercase().contains(&name)
        });
        if let Some(i) = found {
            let item = bullet_item(lines[i]).unwrap_or(lines[i]);
            definition.ingredient_order = if starts_with_amount(item) || first.amount.is_none() {
                IngredientOrder::AmountFirst
            } else {
                IngredientOrder::NameFirst
            };
            definition.ingredient_heading = heading_before(&lines, i, title_line);
        }
    }

    if let Some(first) = draft.steps.first() {
        let text = first.text.trim().to_lowercase();
        let found = lines
            .iter()
            .enumerate()
            .position(|(i, line)| {
                i != title_line && !text.is_empty() && line.to_lowercase().contains(&text)
            });
        if let Some(i) = found {
            definition.step_style = if ordinal_step(lines[i]).is_some() {
                StepStyle::Numbered
            } else if bullet_item(lines[i]).is_some() {
                StepStyle::Bulleted
            } else {
                StepStyle::Paragraph
            };
            definition.step_heading = heading_before(&lines, i, title_line);
        }
    }

    let mut extra_units: Vec<String> = draft
        .ingredients
        .iter()
        .filter_map(|i| i.unit.as_deref())
        .map(|unit| unit.trim().trim_end_matches('.').to_lowercase())
        .filter(|unit| !unit.is_empty() && !vocab.is_unit(unit))
        .collect();
    extra_units.sort();
    extra_units.dedup();
    definition.extra_units = extra_units;

    definition
}

/// Fold a newly derived definition into an existing one
///
/// Marker and unit lists accumulate. Layout choices follow the newest
/// evidence; a heading the new example lacks keeps the old value.
pub fn merge_definitions(existing: &RuleDefinition, derived: RuleDefinition) -> RuleDefinition {
    RuleDefinition {
        title_line: derived.title_line,
        servings_markers: union(&existing.servings_markers, derived.servings_markers),
        prep_time_markers: union(&existing.prep_time_markers, derived.prep_time_markers),
        cook_time_markers: union(&existing.cook_time_markers, derived.cook_time_markers),
        ingredient_heading: derived
            .ingredient_heading
            .or_else(|| existing.ingredient_heading.clone()),
        step_heading: derived.step_heading.or_else(|| existing.step_heading.clone()),
        step_style: derived.step_style,
        ingredient_order: derived.ingredient_order,
        extra_units: union(&existing.extra_units, derived.extra_units),
    }
}

fn union(existing: &[String], added: Vec<String>) -> Vec<String> {
    let mut merged = existing.to_vec();
    for item in added {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

fn title_line(lines: &[&str], draft: &MergedRecipeDraft) -> Option<usize> {
    let title = draft.title.as_ref()?.value.trim().to_lowercase();
    if title.is_empty() {
        return None;
    }
    let text = |line: &str| heading_text(line).unwrap_or(line).trim().to_lowercase();
    lines
        .iter()
        .position(|line| text(*line) == title)
        .or_else(|| lines.iter().position(|line| text(*line).contains(&title)))
}

/// Alphabetic word right after (or else right before) the number
fn word_next_to(line: &str, number: u32) -> Option<String> {
    let tokens = words(line);
    let at = tokens.iter().position(|t| *t == number.to_string())?;
    let alphabetic = |t: &&String| t.chars().all(char::is_alphabetic) && t.chars().count() > 1;
    tokens
        .get(at + 1)
        .filter(alphabetic)
        .or_else(|| at.checked_sub(1).and_then(|i| tokens.get(i)).filter(alphabetic))
        .cloned()
}

fn time_marker(line: &str, vocab: &Vocabulary) -> Option<String> {
    words(line).into_iter().find(|t| {
        t.chars().count() > 2
            && t.chars().all(char::is_alphabetic)
            && !DURATION_WORDS.contains(&t.as_str())
            && !vocab.is_unit(t)
    })
}

/// The line before `index` when it reads like a section heading
fn heading_before(lines: &[&str], index: usize, title_line: usize) -> Option<String> {
    let before = index.checked_sub(1)?;
    if before == title_line {
        return None;
    }
    let line = lines[before];
    let normalized = normalize_heading(line);
    let structural = first_integer(line).is_some()
        || ordinal_step(line).is_some()
        || bullet_item(line).is_some()
        || starts_with_amount(line);
    let short =
        !normalized.is_empty() && normalized.split_whitespace().count() <= MAX_HEADING_WORDS;
    (short && !structural).then_some(normalized)
}
