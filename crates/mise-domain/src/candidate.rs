//! Field-level parse candidates produced by extraction strategies

use crate::Confidence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields of a structured recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Recipe title
    Title,
    /// Number of servings
    Servings,
    /// Preparation time in minutes
    PrepTime,
    /// Cooking/baking time in minutes
    CookTime,
    /// Ordered ingredient list
    Ingredients,
    /// Ordered instruction steps
    Steps,
}

impl FieldName {
    /// Every field, in draft order
    pub const ALL: [FieldName; 6] = [
        FieldName::Title,
        FieldName::Servings,
        FieldName::PrepTime,
        FieldName::CookTime,
        FieldName::Ingredients,
        FieldName::Steps,
    ];

    /// Get the field name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Servings => "servings",
            FieldName::PrepTime => "prep_time",
            FieldName::CookTime => "cook_time",
            FieldName::Ingredients => "ingredients",
            FieldName::Steps => "steps",
        }
    }

    /// Parse a field name from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "title" => Some(FieldName::Title),
            "servings" => Some(FieldName::Servings),
            "prep_time" => Some(FieldName::PrepTime),
            "cook_time" => Some(FieldName::CookTime),
            "ingredients" => Some(FieldName::Ingredients),
            "steps" => Some(FieldName::Steps),
            _ => None,
        }
    }

    /// Required for a draft to be considered complete
    pub fn is_required(&self) -> bool {
        matches!(self, FieldName::Title | FieldName::Ingredients | FieldName::Steps)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    /// Numeric amount, if the line states one
    pub amount: Option<f64>,
    /// Measurement unit as written (e.g. "g", "EL")
    pub unit: Option<String>,
    /// Ingredient name
    pub name: String,
    /// Trust in this particular line
    pub confidence: Confidence,
}

impl IngredientEntry {
    /// Compare content, ignoring confidence and letter case
    pub fn same_content(&self, other: &IngredientEntry) -> bool {
        let amounts_match = match (self.amount, other.amount) {
            (Some(a), Some(b)) => (a - b).abs() < 1e-6,
            (None, None) => true,
            _ => false,
        };
        let units_match = match (&self.unit, &other.unit) {
            (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            (None, None) => true,
            _ => false,
        };
        amounts_match
            && units_match
            && self.name.trim().to_lowercase() == other.name.trim().to_lowercase()
    }
}

/// One instruction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    /// Instruction text
    pub text: String,
    /// Trust in this particular step
    pub confidence: Confidence,
}

/// The value a strategy extracted for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text (title)
    Text(String),
    /// A count (servings)
    Count(u32),
    /// A duration in whole minutes
    Minutes(u32),
    /// Ingredient list
    Ingredients(Vec<IngredientEntry>),
    /// Step list
    Steps(Vec<StepEntry>),
}

impl FieldValue {
    /// Whether this value kind belongs to the given field
    pub fn fits(&self, field: FieldName) -> bool {
        matches!(
            (field, self),
            (FieldName::Title, FieldValue::Text(_))
                | (FieldName::Servings, FieldValue::Count(_))
                | (FieldName::PrepTime, FieldValue::Minutes(_))
                | (FieldName::CookTime, FieldValue::Minutes(_))
                | (FieldName::Ingredients, FieldValue::Ingredients(_))
                | (FieldName::Steps, FieldValue::Steps(_))
        )
    }

    /// Whether the value carries no content
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Count(_) | FieldValue::Minutes(_) => false,
            FieldValue::Ingredients(items) => items.is_empty(),
            FieldValue::Steps(steps) => steps.is_empty(),
        }
    }

    /// Compare content, ignoring per-entry confidences and letter case
    pub fn same_content(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => {
                a.trim().to_lowercase() == b.trim().to_lowercase()
            }
            (FieldValue::Count(a), FieldValue::Count(b)) => a == b,
            (FieldValue::Minutes(a), FieldValue::Minutes(b)) => a == b,
            (FieldValue::Ingredients(a), FieldValue::Ingredients(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_content(y))
            }
            (FieldValue::Steps(a), FieldValue::Steps(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.text.trim().to_lowercase() == y.text.trim().to_lowercase()
                    })
            }
            _ => false,
        }
    }

    /// Mean entry confidence for list values
    pub fn entry_confidence(&self) -> Option<Confidence> {
        match self {
            FieldValue::Ingredients(items) => {
                Some(Confidence::mean(items.iter().map(|i| i.confidence)))
            }
            FieldValue::Steps(steps) => Some(Confidence::mean(steps.iter().map(|s| s.confidence))),
            _ => None,
        }
    }

    /// Copy of this value with every entry confidence overwritten
    pub fn with_entry_confidence(&self, confidence: Confidence) -> FieldValue {
        match self {
            FieldValue::Ingredients(items) => FieldValue::Ingredients(
                items
                    .iter()
                    .map(|i| IngredientEntry { confidence, ..i.clone() })
                    .collect(),
            ),
            FieldValue::Steps(steps) => FieldValue::Steps(
                steps
                    .iter()
                    .map(|s| StepEntry { confidence, ..s.clone() })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Generations of the fixed-rule heuristic parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicVersion {
    /// First-line titles, quantity lines, ordinal steps
    V1,
    /// Adds section headings, times, bullets, imperative and prose steps
    V2,
}

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Fingerprint-matched learned pattern
    Pattern,
    /// Fixed structural rules
    Heuristic(HeuristicVersion),
    /// External completion provider
    Generative,
}

impl StrategyId {
    /// Tie-break rank: lower wins (pattern > heuristic > generative)
    pub fn priority_rank(&self) -> u8 {
        match self {
            StrategyId::Pattern => 0,
            StrategyId::Heuristic(_) => 1,
            StrategyId::Generative => 2,
        }
    }

    /// Stable name for logs and storage
    pub fn name(&self) -> &'static str {
        match self {
            StrategyId::Pattern => "pattern",
            StrategyId::Heuristic(HeuristicVersion::V1) => "heuristic-v1",
            StrategyId::Heuristic(HeuristicVersion::V2) => "heuristic-v2",
            StrategyId::Generative => "generative",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strategy's answer for one field of one segment
///
/// A candidate with `value: None` means the strategy attempted the field and
/// found nothing; it always carries zero confidence. A field a strategy did
/// not attempt has no candidate at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseCandidate {
    /// Segment this candidate belongs to
    pub segment_index: usize,
    /// Producing strategy
    pub strategy: StrategyId,
    /// Target field
    pub field: FieldName,
    /// Extracted value, `None` when attempted but not found
    pub value: Option<FieldValue>,
    /// Trust in the value
    pub confidence: Confidence,
}

impl ParseCandidate {
    /// A found value
    pub fn found(
        segment_index: usize,
        strategy: StrategyId,
        field: FieldName,
        value: FieldValue,
        confidence: Confidence,
    ) -> Self {
        Self {
            segment_index,
            strategy,
            field,
            value: Some(value),
            confidence,
        }
    }

    /// An attempted field with no value
    pub fn not_found(segment_index: usize, strategy: StrategyId, field: FieldName) -> Self {
        Self {
            segment_index,
            strategy,
            field,
            value: None,
            confidence: Confidence::NONE,
        }
    }

    /// Whether this candidate carries usable content
    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_empty())
    }
}
