//! End-to-end runs of the CLI commands against a temporary database

use mise_cli::cli::{ConfigAction, ConfigArgs, CorrectArgs, MineArgs, ParseArgs, RulesArgs};
use mise_cli::commands;
use mise_cli::config::{Config, OutputFormat};
use mise_cli::{CliError, Formatter};
use mise_domain::traits::PatternRuleStore;
use mise_domain::{Correction, DocumentState, FieldName, FieldValue};
use mise_extractor::ParsedDocument;
use mise_store::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LOAF: &str = "Brot\nergibt 1 Laib\n500 g Mehl\nMit etwas Wasser verkneten.";

fn config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database_path = Some(dir.path().join("mise.db"));
    config.extractor.confidence_floor = 0.6;
    config.extractor.learning_backoff_ms = 1;
    config
}

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

fn read_document(path: &Path) -> ParsedDocument {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn parse_args(file: PathBuf, out: PathBuf) -> ParseArgs {
    ParseArgs {
        file,
        hints: Vec::new(),
        fingerprint: Some("family".into()),
        out: Some(out),
        no_fallback: true,
    }
}

#[tokio::test]
async fn test_parse_correct_mine_flow() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let input = dir.path().join("loaf.txt");
    let doc_path = dir.path().join("loaf.json");
    fs::write(&input, LOAF).unwrap();

    commands::execute_parse(parse_args(input, doc_path.clone()), &config, &formatter())
        .await
        .unwrap();
    let document = read_document(&doc_path);
    assert_eq!(document.state, DocumentState::ReviewPending);
    assert_eq!(document.segments.len(), 1);

    let mut correction = Correction::new(document.segments[0].draft.draft_id.clone());
    correction.set(FieldName::Servings, FieldValue::Count(1));
    let corrections_path = dir.path().join("corrections.json");
    fs::write(&corrections_path, serde_json::to_string(&correction).unwrap()).unwrap();

    commands::execute_correct(
        CorrectArgs {
            document: doc_path.clone(),
            corrections: corrections_path,
            out: None,
        },
        &config,
        &formatter(),
    )
    .await
    .unwrap();
    let archived = read_document(&doc_path);
    assert_eq!(archived.state, DocumentState::Archived);
    assert_eq!(archived.segments[0].draft.servings.as_ref().map(|s| s.value), Some(1));

    commands::execute_mine(MineArgs { watch: false, dry_run: false }, &config, &formatter())
        .await
        .unwrap();
    let store = SqliteStore::new(dir.path().join("mise.db")).unwrap();
    assert_eq!(store.example_count().unwrap(), 1);
    let library = store.load_latest().unwrap();
    assert_eq!(library.version, 1);
    assert_eq!(library.active_rule_count(), 1);
    assert_eq!(library.rules[0].fingerprint.as_str(), "family");

    commands::execute_rules(
        RulesArgs {
            all: true,
            fingerprint: Some("family".into()),
            version: Some(1),
        },
        &config,
        &formatter(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_dry_run_mine_publishes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let input = dir.path().join("loaf.txt");
    let doc_path = dir.path().join("loaf.json");
    fs::write(&input, LOAF).unwrap();

    commands::execute_parse(parse_args(input, doc_path.clone()), &config, &formatter())
        .await
        .unwrap();
    let document = read_document(&doc_path);
    let corrections_path = dir.path().join("corrections.json");
    let corrections = vec![Correction::new(document.segments[0].draft.draft_id.clone())];
    fs::write(&corrections_path, serde_json::to_string(&corrections).unwrap()).unwrap();
    commands::execute_correct(
        CorrectArgs {
            document: doc_path,
            corrections: corrections_path,
            out: Some(dir.path().join("archived.json")),
        },
        &config,
        &formatter(),
    )
    .await
    .unwrap();

    commands::execute_mine(MineArgs { watch: false, dry_run: true }, &config, &formatter())
        .await
        .unwrap();
    let store = SqliteStore::new(dir.path().join("mise.db")).unwrap();
    assert_eq!(store.load_latest().unwrap().version, 0);
}

#[tokio::test]
async fn test_correction_for_unknown_draft_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let input = dir.path().join("loaf.txt");
    let doc_path = dir.path().join("loaf.json");
    fs::write(&input, LOAF).unwrap();
    commands::execute_parse(parse_args(input, doc_path.clone()), &config, &formatter())
        .await
        .unwrap();

    let corrections_path = dir.path().join("corrections.json");
    fs::write(&corrections_path, r#"{"draft_id":"nope","corrected_fields":{}}"#).unwrap();
    let result = commands::execute_correct(
        CorrectArgs {
            document: doc_path.clone(),
            corrections: corrections_path,
            out: None,
        },
        &config,
        &formatter(),
    )
    .await;

    assert!(matches!(result, Err(CliError::Extractor(_))));
    let untouched = read_document(&doc_path);
    assert_eq!(untouched.state, DocumentState::ReviewPending);
}

#[tokio::test]
async fn test_parse_rejects_empty_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "  \n").unwrap();

    let result = commands::execute_parse(
        parse_args(input, dir.path().join("out.json")),
        &config(&dir),
        &formatter(),
    )
    .await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_missing_library_version_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = commands::execute_rules(
        RulesArgs {
            all: false,
            fingerprint: None,
            version: Some(7),
        },
        &config(&dir),
        &formatter(),
    );
    assert!(matches!(result, Err(CliError::NotFound(_))));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let init = |force| ConfigArgs {
        action: ConfigAction::Init { force },
    };

    commands::execute_config(init(false), &Config::default(), &path, &formatter()).unwrap();
    assert!(path.exists());
    assert!(Config::load_from(&path).is_ok());

    let again = commands::execute_config(init(false), &Config::default(), &path, &formatter());
    assert!(matches!(again, Err(CliError::InvalidInput(_))));
    commands::execute_config(init(true), &Config::default(), &path, &formatter()).unwrap();
}
