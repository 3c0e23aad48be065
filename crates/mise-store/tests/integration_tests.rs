//! Integration tests for mise-store
//!
//! These tests exercise the training log and library persistence against an
//! on-disk database.

use mise_domain::traits::{PatternRuleStore, TrainingLog};
use mise_domain::{
    Confidence, DraftId, FieldName, FieldValue, Fingerprint, HeuristicVersion, MergedRecipeDraft,
    NewTrainingExample, PatternLibraryVersion, PatternRule, RuleDefinition, StepStyle, StrategyId,
    TrainingExample,
};
use mise_store::{SqliteStore, StoreError};
use tempfile::TempDir;

fn draft(fp: &str, title: &str) -> MergedRecipeDraft {
    let id = DraftId::new(format!("draft-{title}"));
    let mut d = MergedRecipeDraft::empty(id, 0, Fingerprint::new(fp), 1);
    d.set_field(
        FieldName::Title,
        Some(FieldValue::Text(title.to_string())),
        Confidence::new(0.75),
        Some(StrategyId::Heuristic(HeuristicVersion::V2)),
    );
    d.assess(0.5);
    d
}

fn example(fp: &str, before: &str, after: &str) -> NewTrainingExample {
    let original = draft(fp, before);
    let corrected = draft(fp, after);
    let text = format!("{before}\n1. Rühren");
    NewTrainingExample::from_review(&original, corrected, text, 1_700_000_000)
}

fn rule(id: u64, fp: &str, rate: f64) -> PatternRule {
    PatternRule {
        id,
        fingerprint: Fingerprint::new(fp),
        rule_definition: RuleDefinition {
            title_line: 1,
            servings_markers: vec!["personen".into()],
            step_style: StepStyle::Numbered,
            ..Default::default()
        },
        success_rate: rate,
        sample_count: 3,
        retired: false,
        updated_at: 1_700_000_000,
    }
}

#[test]
fn test_append_assigns_increasing_ids() {
    let mut store = SqliteStore::in_memory().unwrap();

    let first = store.append(example("fp-a", "4 Personen", "Brot")).unwrap();
    let second = store.append(example("fp-b", "Kuchen", "Apfelkuchen")).unwrap();

    assert!(second.id > first.id);
    assert_eq!(store.example_count().unwrap(), 2);
}

#[test]
fn test_examples_round_trip_with_diff() {
    let mut store = SqliteStore::in_memory().unwrap();
    let stored = store.append(example("fp-a", "4 Personen", "Brot")).unwrap();

    let loaded = store.examples_after(0).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], stored);
    assert_eq!(loaded[0].example.diff.fields(), vec![FieldName::Title]);
}

#[test]
fn test_examples_after_watermark() {
    let mut store = SqliteStore::in_memory().unwrap();
    let first = store.append(example("fp-a", "A", "B")).unwrap();
    store.append(example("fp-a", "C", "D")).unwrap();
    store.append(example("fp-b", "E", "F")).unwrap();

    let newer = store.examples_after(first.id).unwrap();
    assert_eq!(newer.len(), 2);
    assert!(newer.iter().all(|e| e.id > first.id));

}

#[test]
fn test_recent_examples_for_fingerprint() {
    let mut store = SqliteStore::in_memory().unwrap();
    let first = store.append(example("fp-a", "A", "B")).unwrap();
    let second = store.append(example("fp-a", "C", "D")).unwrap();
    store.append(example("fp-b", "E", "F")).unwrap();
    let fourth = store.append(example("fp-a", "G", "H")).unwrap();

    let fp = Fingerprint::new("fp-a");
    let ids = |through: u64, limit: usize| -> Vec<u64> {
        let examples: Vec<TrainingExample> =
            store.examples_for_fingerprint(&fp, through, limit).unwrap();
        examples.iter().map(|e| e.id).collect()
    };

    assert_eq!(ids(10, 10), vec![first.id, second.id, fourth.id]);
    // only the newest within the window, still in id order
    assert_eq!(ids(10, 2), vec![second.id, fourth.id]);
    assert_eq!(ids(second.id, 10), vec![first.id, second.id]);
    assert!(ids(10, 0).is_empty());
}

#[test]
fn test_save_and_load_versions() {
    let mut store = SqliteStore::in_memory().unwrap();

    let v1 = PatternLibraryVersion {
        version: 1,
        mined_through: 4,
        created_at: 100,
        rules: vec![rule(1, "fp-a", 0.6)],
    };
    store.save_version(&v1).unwrap();

    let mut retired = rule(2, "fp-b", 0.1);
    retired.retired = true;
    let v2 = PatternLibraryVersion {
        version: 2,
        mined_through: 9,
        created_at: 200,
        rules: vec![rule(1, "fp-a", 0.72), retired],
    };
    store.save_version(&v2).unwrap();

    assert_eq!(store.load_latest().unwrap(), v2);
    assert_eq!(store.load_version(1).unwrap(), Some(v1));
    assert_eq!(store.list_versions().unwrap(), vec![1, 2]);
}

#[test]
fn test_stale_version_is_rejected() {
    let mut store = SqliteStore::in_memory().unwrap();
    let v1 = PatternLibraryVersion {
        version: 1,
        ..Default::default()
    };
    store.save_version(&v1).unwrap();

    let result = store.save_version(&v1);
    assert!(matches!(
        result,
        Err(StoreError::VersionConflict { version: 1, latest: 1 })
    ));
}

#[test]
fn test_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mise.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.append(example("fp-a", "4 Personen", "Brot")).unwrap();
        store
            .save_version(&PatternLibraryVersion {
                version: 1,
                mined_through: 1,
                created_at: 5,
                rules: vec![rule(1, "fp-a", 0.65)],
            })
            .unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert_eq!(store.example_count().unwrap(), 1);
    let library = store.load_latest().unwrap();
    assert_eq!(library.version, 1);
    assert_eq!(library.lookup(&Fingerprint::new("fp-a")).len(), 1);
}
