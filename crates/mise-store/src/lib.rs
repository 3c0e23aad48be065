//! Mise Storage Layer
//!
//! SQLite persistence for the learning loop:
//!
//! - `training_examples`: the append-only correction log (`TrainingLog`)
//! - `library_versions` / `pattern_rules`: every published pattern library
//!   version, stored whole (`PatternRuleStore`)
//!
//! Append-only and immutability guarantees are enforced by triggers in the
//! schema, not just by the absence of update methods.
//!
//! # Examples
//!
//! ```no_run
//! use mise_store::SqliteStore;
//! use mise_domain::traits::PatternRuleStore;
//!
//! let store = SqliteStore::new("mise.db").unwrap();
//! let library = store.load_latest().unwrap();
//! println!("library v{} has {} rules", library.version, library.rules.len());
//! ```

#![warn(missing_docs)]

use mise_domain::traits::{PatternRuleStore, TrainingLog};
use mise_domain::{
    DraftId, Fingerprint, NewTrainingExample, PatternLibraryVersion, PatternRule,
    TrainingExample,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A version at or below the latest one was saved
    #[error("Library version {version} is not newer than stored version {latest}")]
    VersionConflict {
        /// Version that was offered
        version: u64,
        /// Latest stored version
        latest: u64,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of `TrainingLog` and `PatternRuleStore`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store behind a mutex or
/// give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// An in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of logged training examples
    pub fn example_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM training_examples", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// A specific library version, if it was ever saved
    pub fn load_version(&self, version: u64) -> Result<Option<PatternLibraryVersion>, StoreError> {
        let header = self
            .conn
            .query_row(
                "SELECT version, mined_through, created_at FROM library_versions WHERE version = ?1",
                params![version as i64],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)? as u64,
                        row.get::<_, i64>(1)? as u64,
                        row.get::<_, i64>(2)? as u64,
                    ))
                },
            )
            .optional()?;

        match header {
            Some((version, mined_through, created_at)) => Ok(Some(PatternLibraryVersion {
                version,
                mined_through,
                created_at,
                rules: self.load_rules(version)?,
            })),
            None => Ok(None),
        }
    }

    /// Stored version numbers, oldest first
    pub fn list_versions(&self) -> Result<Vec<u64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM library_versions ORDER BY version")?;
        let versions = stmt
            .query_map([], |row| row.get::<_, i64>(0).map(|v| v as u64))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(versions)
    }

    fn latest_version_number(&self) -> Result<u64, StoreError> {
        let latest: Option<i64> = self
            .conn
            .query_row("SELECT MAX(version) FROM library_versions", [], |row| row.get(0))?;
        Ok(latest.unwrap_or(0) as u64)
    }

    fn load_rules(&self, version: u64) -> Result<Vec<PatternRule>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT rule_id, fingerprint, definition, success_rate, sample_count, retired, updated_at
             FROM pattern_rules WHERE version = ?1 ORDER BY rule_id",
        )?;
        let rows = stmt
            .query_map(params![version as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)? as u64,
                    row.get::<_, bool>(5)?,
                    row.get::<_, i64>(6)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, fingerprint, definition, success_rate, sample_count, retired, updated_at)| {
                    Ok(PatternRule {
                        id,
                        fingerprint: Fingerprint::new(fingerprint),
                        rule_definition: serde_json::from_str(&definition)?,
                        success_rate,
                        sample_count,
                        retired,
                        updated_at,
                    })
                },
            )
            .collect()
    }
}

/// Row as read from `training_examples`, before JSON decoding
struct RawExample {
    id: i64,
    fingerprint: String,
    draft_id: String,
    segment_text: String,
    original_draft: String,
    corrected_draft: String,
    diff: String,
    created_at: i64,
}

fn raw_example(row: &Row<'_>) -> rusqlite::Result<RawExample> {
    Ok(RawExample {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        draft_id: row.get(2)?,
        segment_text: row.get(3)?,
        original_draft: row.get(4)?,
        corrected_draft: row.get(5)?,
        diff: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl RawExample {
    fn decode(self) -> Result<TrainingExample, StoreError> {
        if self.id <= 0 {
            return Err(StoreError::InvalidData(format!(
                "training example id must be positive, got {}",
                self.id
            )));
        }
        Ok(TrainingExample {
            id: self.id as u64,
            example: NewTrainingExample {
                document_fingerprint: Fingerprint::new(self.fingerprint),
                draft_id: DraftId::new(self.draft_id),
                segment_text: self.segment_text,
                original_draft: serde_json::from_str(&self.original_draft)?,
                corrected_draft: serde_json::from_str(&self.corrected_draft)?,
                diff: serde_json::from_str(&self.diff)?,
                created_at: self.created_at as u64,
            },
        })
    }
}

impl TrainingLog for SqliteStore {
    type Error = StoreError;

    fn append(&mut self, example: NewTrainingExample) -> Result<TrainingExample, Self::Error> {
        let original = serde_json::to_string(&example.original_draft)?;
        let corrected = serde_json::to_string(&example.corrected_draft)?;
        let diff = serde_json::to_string(&example.diff)?;

        self.conn.execute(
            "INSERT INTO training_examples
             (fingerprint, draft_id, segment_text, original_draft, corrected_draft, diff, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                example.document_fingerprint.as_str(),
                example.draft_id.as_str(),
                &example.segment_text,
                original,
                corrected,
                diff,
                example.created_at as i64,
            ],
        )?;

        let id = self.conn.last_insert_rowid() as u64;
        debug!(id, fingerprint = %example.document_fingerprint, "Appended training example");
        Ok(TrainingExample { id, example })
    }

    fn examples_after(&self, after: u64) -> Result<Vec<TrainingExample>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fingerprint, draft_id, segment_text, original_draft, corrected_draft, diff, created_at
             FROM training_examples WHERE id > ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![after as i64], raw_example)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawExample::decode).collect()
    }

    fn examples_for_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        through: u64,
        limit: usize,
    ) -> Result<Vec<TrainingExample>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fingerprint, draft_id, segment_text, original_draft, corrected_draft, diff, created_at
             FROM training_examples WHERE fingerprint = ?1 AND id <= ?2
             ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(
                params![fingerprint.as_str(), through as i64, limit as i64],
                raw_example,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        let mut examples = rows
            .into_iter()
            .map(RawExample::decode)
            .collect::<Result<Vec<_>, _>>()?;
        examples.reverse();
        Ok(examples)
    }
}

impl PatternRuleStore for SqliteStore {
    type Error = StoreError;

    fn save_version(&mut self, library: &PatternLibraryVersion) -> Result<(), Self::Error> {
        let latest = self.latest_version_number()?;
        if library.version <= latest {
            return Err(StoreError::VersionConflict {
                version: library.version,
                latest,
            });
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO library_versions (version, mined_through, created_at) VALUES (?1, ?2, ?3)",
            params![
                library.version as i64,
                library.mined_through as i64,
                library.created_at as i64,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pattern_rules
                 (version, rule_id, fingerprint, definition, success_rate, sample_count, retired, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for rule in &library.rules {
                stmt.execute(params![
                    library.version as i64,
                    rule.id as i64,
                    rule.fingerprint.as_str(),
                    serde_json::to_string(&rule.rule_definition)?,
                    rule.success_rate,
                    rule.sample_count as i64,
                    rule.retired,
                    rule.updated_at as i64,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            version = library.version,
            rules = library.rules.len(),
            mined_through = library.mined_through,
            "Saved pattern library version"
        );
        Ok(())
    }

    fn load_latest(&self) -> Result<PatternLibraryVersion, Self::Error> {
        let latest = self.latest_version_number()?;
        if latest == 0 {
            return Ok(PatternLibraryVersion::empty());
        }
        self.load_version(latest)?.ok_or_else(|| {
            StoreError::InvalidData(format!("library version {} vanished during load", latest))
        })
    }
}
