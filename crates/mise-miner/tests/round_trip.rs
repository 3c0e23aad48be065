//! Integration tests for the learning loop
//!
//! Parse, correct, mine, and parse again against an on-disk database.

use mise_domain::traits::PatternRuleStore;
use mise_domain::{
    Confidence, Correction, DocumentState, DraftId, FieldName, FieldValue, Fingerprint,
    IngredientEntry, MergedRecipeDraft, NewTrainingExample, PatternLibraryVersion, PatternRule,
    RuleDefinition, StepEntry, StrategyId, TrainingExample,
};
use mise_extractor::{
    CorrectionRecorder, Extractor, ExtractorConfig, PatternLibrary, SourceDocument,
};
use mise_miner::{MinerConfig, MinerWorker, PatternMiner};
use mise_store::SqliteStore;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const LOAF: &str = "Brot\nergibt 1 Laib\n500 g Mehl\nMit etwas Wasser verkneten.";

fn rule(id: u64, fp: &str, rate: f64) -> PatternRule {
    PatternRule {
        id,
        fingerprint: Fingerprint::new(fp),
        rule_definition: RuleDefinition {
            servings_markers: vec!["personen".into()],
            ..Default::default()
        },
        success_rate: rate,
        sample_count: 4,
        retired: false,
        updated_at: 0,
    }
}

fn rate_of(library: &PatternLibraryVersion, id: u64) -> f64 {
    library
        .rules
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.success_rate)
        .unwrap_or(f64::NAN)
}

#[tokio::test]
async fn test_correction_round_trip_improves_matching_rule() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(Mutex::new(SqliteStore::new(dir.path().join("mise.db")).unwrap()));

    let seed = PatternLibraryVersion {
        version: 1,
        rules: vec![rule(1, "family", 0.5), rule(2, "other", 0.8)],
        ..Default::default()
    };
    store.lock().unwrap().save_version(&seed).unwrap();
    let library = Arc::new(PatternLibrary::new(seed.clone()));

    let config = ExtractorConfig {
        confidence_floor: 0.6,
        learning_backoff_ms: 1,
        ..Default::default()
    };
    let extractor = Extractor::new(config.clone(), Arc::clone(&library));
    let source = || SourceDocument::new(LOAF).with_fingerprint(Fingerprint::new("family"));

    // The prose step lands under the raised floor
    let mut document = extractor.parse_document(source()).await.unwrap();
    assert_eq!(document.state, DocumentState::ReviewPending);
    assert!(document.segments[0].draft.servings.is_none());

    let mut correction = Correction::new(document.segments[0].draft.draft_id.clone());
    correction.set(FieldName::Servings, FieldValue::Count(1));
    let recorder = CorrectionRecorder::shared(Arc::clone(&store), &config);
    let report = recorder.submit(&mut document, vec![correction]).await.unwrap();
    assert_eq!(report.recorded.len(), 1);
    assert_eq!(report.recorded[0].example.diff.fields(), vec![FieldName::Servings]);

    let mut worker = MinerWorker::new(MinerConfig::default(), Arc::clone(&library));
    let outcome = worker.mine_once(&store).unwrap();

    assert_eq!(outcome.library.version, 2);
    assert_eq!(outcome.revised, vec![1]);
    assert!(rate_of(&outcome.library, 1) > 0.5);
    assert_eq!(rate_of(&outcome.library, 2), 0.8);
    assert!(outcome.library.rules[0]
        .rule_definition
        .servings_markers
        .contains(&"laib".to_string()));
    assert_eq!(library.version(), 2);
    assert_eq!(store.lock().unwrap().load_latest().unwrap(), outcome.library);

    // The next parse of the same layout picks up the learned servings cue
    let reparsed = extractor.parse_document(source()).await.unwrap();
    let draft = &reparsed.segments[0].draft;
    assert_eq!(reparsed.library_version, 2);
    assert_eq!(draft.servings.as_ref().map(|s| s.value), Some(1));
    assert_eq!(draft.sources.get(&FieldName::Servings), Some(&StrategyId::Pattern));
}

#[tokio::test]
async fn test_new_fingerprint_gets_a_rule() {
    let store = Arc::new(Mutex::new(SqliteStore::in_memory().unwrap()));
    let library = Arc::new(PatternLibrary::empty());
    let config = ExtractorConfig {
        confidence_floor: 0.6,
        learning_backoff_ms: 1,
        ..Default::default()
    };
    let extractor = Extractor::new(config.clone(), Arc::clone(&library));

    let mut document = extractor
        .parse_document(SourceDocument::new(LOAF).with_fingerprint(Fingerprint::new("fresh")))
        .await
        .unwrap();
    let correction = Correction::new(document.segments[0].draft.draft_id.clone());
    CorrectionRecorder::shared(Arc::clone(&store), &config)
        .submit(&mut document, vec![correction])
        .await
        .unwrap();

    let mut worker = MinerWorker::new(MinerConfig::default(), Arc::clone(&library));
    let outcome = worker.mine_once(&store).unwrap();
    assert_eq!(outcome.created, vec![1]);
    assert_eq!(library.current().lookup(&Fingerprint::new("fresh")).len(), 1);
}

const PANCAKES: &str = "Pfannkuchen\n4 Personen\n200 g Mehl\n1. Mehl sieben";

/// A reviewed pancake segment with whatever values the reviewer typed in
fn pancake_example(
    id: u64,
    title: &str,
    servings: u32,
    amount: f64,
    name: &str,
) -> TrainingExample {
    let original = MergedRecipeDraft::empty(DraftId::new("d"), 0, Fingerprint::new("family"), 0);
    let mut corrected = original.clone();
    let mut set = |field, value| corrected.set_field(field, Some(value), Confidence::CERTAIN, None);
    set(FieldName::Title, FieldValue::Text(title.into()));
    set(FieldName::Servings, FieldValue::Count(servings));
    set(
        FieldName::Ingredients,
        FieldValue::Ingredients(vec![IngredientEntry {
            amount: Some(amount),
            unit: Some("g".into()),
            name: name.into(),
            confidence: Confidence::CERTAIN,
        }]),
    );
    set(
        FieldName::Steps,
        FieldValue::Steps(vec![StepEntry {
            text: "Mehl sieben".into(),
            confidence: Confidence::CERTAIN,
        }]),
    );
    TrainingExample {
        id,
        example: NewTrainingExample::from_review(&original, corrected, PANCAKES, 0),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_correction_raises_matching_rule(
        unrelated in prop::collection::vec(0.0f64..=1.0, 1..6),
        target in 0.0f64..0.99,
        title in "[A-Za-zäöü][A-Za-zäöü ]{0,24}",
        servings in 1u32..50,
        amount in 1u32..2000,
        name in "[A-Za-zäöü][A-Za-zäöü0-9 ]{0,24}",
    ) {
        let mut rules = vec![rule(1, "family", target)];
        for (i, rate) in unrelated.iter().enumerate() {
            rules.push(rule(i as u64 + 2, &format!("other-{i}"), *rate));
        }
        let current = PatternLibraryVersion { version: 1, rules, ..Default::default() };
        let example = pancake_example(1, &title, servings, f64::from(amount), &name);

        let outcome = PatternMiner::new(MinerConfig::default()).mine(&current, &[example], 0);

        for (i, rate) in unrelated.iter().enumerate() {
            prop_assert_eq!(rate_of(&outcome.library, i as u64 + 2), *rate);
        }
        prop_assert!(outcome.created.is_empty());
        prop_assert_eq!(&outcome.revised, &vec![1]);
        prop_assert!(rate_of(&outcome.library, 1) > target);
        prop_assert!(!outcome.library.lookup(&Fingerprint::new("family")).is_empty());
    }
}
