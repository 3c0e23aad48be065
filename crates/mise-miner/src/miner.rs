//! Core mining pass: training examples in, next library version out

use crate::derive::{derive_definition, merge_definitions};
use crate::{MinerConfig, MinerMetrics};
use mise_domain::{
    FieldName, Fingerprint, PatternLibraryVersion, PatternRule, RuleDefinition, Segment,
    TrainingExample,
};
use mise_extractor::apply_rule;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Result of one mining pass
#[derive(Debug, Clone, PartialEq)]
pub struct MiningOutcome {
    /// The next library version, or a copy of the input when nothing was new
    pub library: PatternLibraryVersion,
    /// Training examples folded in by this pass
    pub examples_consumed: usize,
    /// Ids of rules created
    pub created: Vec<u64>,
    /// Ids of existing rules whose definition was revised
    pub revised: Vec<u64>,
    /// Ids of rules retired by this pass
    pub retired: Vec<u64>,
    /// Earlier examples replayed against revised rules
    pub replayed: usize,
    /// Replays that still reproduced the corrected draft
    pub reproduced: usize,
    /// Replays the rule reproduced before its revision but no longer does
    pub regressed: usize,
}

impl MiningOutcome {
    /// Whether the pass produced a new version
    pub fn has_new_version(&self) -> bool {
        self.examples_consumed > 0
    }
}

/// Turns training examples into pattern rules
///
/// Mining is a pure function of the current library version and the log:
/// it never touches a published version, and the same inputs always mine
/// the same next version.
///
/// # Examples
///
/// ```
/// use mise_domain::PatternLibraryVersion;
/// use mise_miner::{MinerConfig, PatternMiner};
///
/// let mut miner = PatternMiner::new(MinerConfig::default());
/// let outcome = miner.mine(&PatternLibraryVersion::empty(), &[], 0);
/// assert!(!outcome.has_new_version());
/// assert_eq!(miner.metrics().runs, 1);
/// ```
pub struct PatternMiner {
    config: MinerConfig,
    metrics: MinerMetrics,
}

impl PatternMiner {
    /// Create a miner with the given configuration
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            metrics: MinerMetrics::new(),
        }
    }

    /// Create a miner with default configuration
    pub fn default_config() -> Self {
        Self::new(MinerConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Counters accumulated across passes
    pub fn metrics(&self) -> &MinerMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut MinerMetrics {
        &mut self.metrics
    }

    /// Mine every example newer than `current.mined_through`
    ///
    /// Examples are grouped by fingerprint. Each one is folded into its
    /// fingerprint's best active rule (or seeds a new rule) and counts as a
    /// confirmed use of that rule. Examples at or below the watermark are
    /// history: after a revision the newest `replay_window` of them are
    /// replayed, and every one the old definition reproduced but the revised
    /// one misses counts as a failure. Rules of fingerprints without new
    /// examples are carried over unchanged.
    pub fn mine(
        &mut self,
        current: &PatternLibraryVersion,
        examples: &[TrainingExample],
        now: u64,
    ) -> MiningOutcome {
        self.metrics.record_run();

        let mut groups: BTreeMap<&Fingerprint, Vec<&TrainingExample>> = BTreeMap::new();
        let mut history: BTreeMap<&Fingerprint, Vec<&TrainingExample>> = BTreeMap::new();
        for example in examples {
            let bucket = if example.id > current.mined_through {
                &mut groups
            } else {
                &mut history
            };
            bucket.entry(example.fingerprint()).or_default().push(example);
        }
        for earlier in history.values_mut() {
            earlier.sort_by_key(|e| e.id);
        }

        let mut outcome = MiningOutcome {
            library: current.clone(),
            examples_consumed: groups.values().map(Vec::len).sum(),
            created: Vec::new(),
            revised: Vec::new(),
            retired: Vec::new(),
            replayed: 0,
            reproduced: 0,
            regressed: 0,
        };
        if outcome.examples_consumed == 0 {
            debug!("No new training examples since #{}", current.mined_through);
            return outcome;
        }

        let alpha = self.config.ema_alpha;
        let mut rules = current.rules.clone();
        let mut next_id = current.next_rule_id();
        let mut mined_through = current.mined_through;

        for (fingerprint, mut group) in groups {
            group.sort_by_key(|e| e.id);

            let (index, previous) = match best_active(&rules, fingerprint) {
                Some(index) => {
                    outcome.revised.push(rules[index].id);
                    (index, Some(rules[index].rule_definition.clone()))
                }
                None => {
                    rules.push(PatternRule {
                        id: next_id,
                        fingerprint: fingerprint.clone(),
                        rule_definition: RuleDefinition::default(),
                        success_rate: self.config.initial_success_rate,
                        sample_count: 0,
                        retired: false,
                        updated_at: now,
                    });
                    outcome.created.push(next_id);
                    info!("Created rule {} for fingerprint {}", next_id, fingerprint);
                    next_id += 1;
                    (rules.len() - 1, None)
                }
            };

            for (n, example) in group.into_iter().enumerate() {
                mined_through = mined_through.max(example.id);
                let derived = derive_definition(example, self.config.locale);
                let rule = &mut rules[index];
                rule.rule_definition = if n == 0 && previous.is_none() {
                    derived
                } else {
                    merge_definitions(&rule.rule_definition, derived)
                };

                let before = rule.success_rate;
                rule.record_outcome(true, alpha);
                rule.updated_at = now;
                debug!(
                    "Example #{} confirmed rule {} (rate {:.3} -> {:.3})",
                    example.id, rule.id, before, rule.success_rate
                );
            }

            if let Some(previous) = previous {
                let earlier = history.get(fingerprint).map(Vec::as_slice).unwrap_or_default();
                let window = &earlier[earlier.len().saturating_sub(self.config.replay_window)..];
                for example in window {
                    outcome.replayed += 1;
                    if self.reproduces(&rules[index].rule_definition, example) {
                        outcome.reproduced += 1;
                    } else if self.reproduces(&previous, example) {
                        outcome.regressed += 1;
                        let rule = &mut rules[index];
                        rule.record_outcome(false, alpha);
                        debug!(
                            "Rule {} no longer reproduces example #{} (rate {:.3})",
                            rule.id, example.id, rule.success_rate
                        );
                    }
                }
            }

            let rule = &mut rules[index];
            if rule.retire_below(self.config.success_floor) {
                info!(
                    "Retired rule {} for fingerprint {} (rate {:.3} < floor {})",
                    rule.id, fingerprint, rule.success_rate, self.config.success_floor
                );
                outcome.retired.push(rule.id);
            }
        }

        outcome.library = PatternLibraryVersion {
            version: current.version + 1,
            mined_through,
            created_at: now,
            rules,
        };

        self.metrics.record_examples(outcome.examples_consumed);
        self.metrics.record_created(outcome.created.len());
        self.metrics.record_revised(outcome.revised.len());
        self.metrics.record_retired(outcome.retired.len());

        info!(
            "Mined library v{}: {} examples, {} created, {} revised, {} retired, \
             {}/{} replays reproduced, {} regressed",
            outcome.library.version,
            outcome.examples_consumed,
            outcome.created.len(),
            outcome.revised.len(),
            outcome.retired.len(),
            outcome.reproduced,
            outcome.replayed,
            outcome.regressed
        );
        outcome
    }

    /// Whether replaying `definition` on the example's segment reproduces
    /// enough of the corrected draft
    pub fn reproduces(&self, definition: &RuleDefinition, example: &TrainingExample) -> bool {
        let corrected = &example.example.corrected_draft;
        let segment = Segment::standalone(example.example.segment_text.as_str());
        let application = apply_rule(definition, &segment, self.config.locale);

        let mut expected = 0usize;
        let mut matched = 0usize;
        for field in FieldName::ALL {
            let Some(wanted) = corrected.field_value(field) else {
                continue;
            };
            if !application.attempted.contains(&field) {
                continue;
            }
            expected += 1;
            if application
                .findings
                .value(field)
                .is_some_and(|(found, _)| found.same_content(&wanted))
            {
                matched += 1;
            }
        }

        expected > 0 && matched as f64 / expected as f64 >= self.config.reproduction_threshold
    }
}

/// Index of the rule `lookup` would pick for a fingerprint
fn best_active(rules: &[PatternRule], fingerprint: &Fingerprint) -> Option<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| !rule.retired && &rule.fingerprint == fingerprint)
        .max_by(|(_, a), (_, b)| {
            a.success_rate
                .total_cmp(&b.success_rate)
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|(index, _)| index)
}
