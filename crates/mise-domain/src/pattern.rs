//! Learned pattern rules and versioned pattern libraries
//!
//! A library version is an immutable snapshot. The miner never edits a
//! version in place: it builds the next one and publishes it whole.

use crate::Fingerprint;
use serde::{Deserialize, Serialize};

/// How steps are laid out in a layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStyle {
    /// "1. Mix", "2) Bake"
    Numbered,
    /// "- Mix", "• Bake"
    Bulleted,
    /// One step per plain line
    Paragraph,
}

/// Whether ingredient lines lead with the amount or the name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientOrder {
    /// "200 g Mehl"
    AmountFirst,
    /// "Mehl 200 g"
    NameFirst,
}

/// Structural extraction rule for one layout family
///
/// Every populated cue is something the rule expects to find; the share of
/// cues actually found is the rule's structural match score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Index of the title among the segment's non-empty lines
    pub title_line: usize,
    /// Words that sit next to the servings count ("personen", "serves")
    #[serde(default)]
    pub servings_markers: Vec<String>,
    /// Words that introduce the preparation time
    #[serde(default)]
    pub prep_time_markers: Vec<String>,
    /// Words that introduce the cooking time
    #[serde(default)]
    pub cook_time_markers: Vec<String>,
    /// Heading line that opens the ingredient block
    #[serde(default)]
    pub ingredient_heading: Option<String>,
    /// Heading line that opens the step block
    #[serde(default)]
    pub step_heading: Option<String>,
    /// Step layout
    pub step_style: StepStyle,
    /// Ingredient line layout
    pub ingredient_order: IngredientOrder,
    /// Units seen in corrections that the locale vocabulary lacks
    #[serde(default)]
    pub extra_units: Vec<String>,
}

impl Default for RuleDefinition {
    fn default() -> Self {
        Self {
            title_line: 0,
            servings_markers: Vec::new(),
            prep_time_markers: Vec::new(),
            cook_time_markers: Vec::new(),
            ingredient_heading: None,
            step_heading: None,
            step_style: StepStyle::Numbered,
            ingredient_order: IngredientOrder::AmountFirst,
            extra_units: Vec::new(),
        }
    }
}

/// A learned, fingerprint-scoped extraction rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Library-wide rule identifier
    pub id: u64,
    /// Layout family this rule applies to
    pub fingerprint: Fingerprint,
    /// What the rule looks for
    pub rule_definition: RuleDefinition,
    /// Exponential moving average of replay outcomes, in [0, 1]
    pub success_rate: f64,
    /// Number of outcomes folded into `success_rate`
    pub sample_count: u64,
    /// Soft-deleted: kept for audit, excluded from lookup
    #[serde(default)]
    pub retired: bool,
    /// Unix seconds of the last revision
    pub updated_at: u64,
}

impl PatternRule {
    /// Fold one confirmed outcome into the success rate
    ///
    /// `rate = (1 - alpha) * rate + alpha * outcome`
    pub fn record_outcome(&mut self, success: bool, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = ((1.0 - alpha) * self.success_rate + alpha * outcome).clamp(0.0, 1.0);
        self.sample_count += 1;
    }

    /// Retire the rule when its success rate has fallen under the floor
    ///
    /// Returns true if this call retired it.
    pub fn retire_below(&mut self, floor: f64) -> bool {
        if !self.retired && self.success_rate < floor {
            self.retired = true;
            return true;
        }
        false
    }
}

/// One immutable, numbered snapshot of the pattern library
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternLibraryVersion {
    /// Monotonic version number; 0 is the empty bootstrap library
    pub version: u64,
    /// Highest training example id already folded into this version
    pub mined_through: u64,
    /// Unix seconds
    pub created_at: u64,
    /// All rules, including retired ones
    pub rules: Vec<PatternRule>,
}

impl PatternLibraryVersion {
    /// The empty bootstrap library (version 0)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Active rules for a fingerprint, best success rate first
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Vec<&PatternRule> {
        let mut matches: Vec<&PatternRule> = self
            .rules
            .iter()
            .filter(|rule| !rule.retired && &rule.fingerprint == fingerprint)
            .collect();
        matches.sort_by(|a, b| {
            b.success_rate
                .total_cmp(&a.success_rate)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches
    }

    /// Identifier for the next new rule
    pub fn next_rule_id(&self) -> u64 {
        self.rules.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
    }

    /// Number of rules still eligible for lookup
    pub fn active_rule_count(&self) -> usize {
        self.rules.iter().filter(|r| !r.retired).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u64, fp: &str, rate: f64) -> PatternRule {
        PatternRule {
            id,
            fingerprint: Fingerprint::new(fp),
            rule_definition: RuleDefinition::default(),
            success_rate: rate,
            sample_count: 1,
            retired: false,
            updated_at: 0,
        }
    }

    #[test]
    fn test_ema_moves_toward_outcome() {
        let mut r = rule(1, "a", 0.5);
        r.record_outcome(true, 0.5);
        assert!((r.success_rate - 0.75).abs() < 1e-9);
        r.record_outcome(false, 0.5);
        assert!((r.success_rate - 0.375).abs() < 1e-9);
        assert_eq!(r.sample_count, 3);
    }

    #[test]
    fn test_retire_below_floor_once() {
        let mut r = rule(1, "a", 0.1);
        assert!(r.retire_below(0.2));
        assert!(r.retired);
        assert!(!r.retire_below(0.2));
    }

    #[test]
    fn test_lookup_orders_and_filters() {
        let mut retired = rule(3, "a", 0.99);
        retired.retired = true;
        let library = PatternLibraryVersion {
            version: 2,
            rules: vec![rule(1, "a", 0.4), rule(2, "a", 0.9), retired, rule(4, "b", 0.95)],
            ..Default::default()
        };

        let ids: Vec<u64> = library.lookup(&Fingerprint::new("a")).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(library.lookup(&Fingerprint::new("zzz")).is_empty());
        assert_eq!(library.active_rule_count(), 3);
        assert_eq!(library.next_rule_id(), 5);
    }

    #[test]
    fn test_empty_library() {
        let library = PatternLibraryVersion::empty();
        assert_eq!(library.version, 0);
        assert_eq!(library.next_rule_id(), 1);
    }
}
