//! Background worker for periodic mining

use crate::{MinerConfig, MinerError, MinerMetrics, MiningOutcome, PatternMiner};
use mise_domain::traits::{PatternRuleStore, TrainingLog};
use mise_domain::Fingerprint;
use mise_extractor::PatternLibrary;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{interval, Duration};

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Background worker that mines on a schedule and publishes each new
/// version to the live pattern library
///
/// The store lock is held only while reading the log and while saving the
/// mined version, never while mining, so live parses and correction
/// recording are not held up.
///
/// # Examples
///
/// ```no_run
/// use mise_extractor::PatternLibrary;
/// use mise_miner::{MinerConfig, MinerWorker};
/// use mise_store::SqliteStore;
/// use std::sync::{Arc, Mutex};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(Mutex::new(SqliteStore::new("mise.db")?));
///     let library = Arc::new(PatternLibrary::empty());
///     let mut worker = MinerWorker::new(MinerConfig::default(), library);
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(store).await?;
///     Ok(())
/// }
/// ```
pub struct MinerWorker {
    miner: PatternMiner,
    interval: Duration,
    library: Arc<PatternLibrary>,
}

impl MinerWorker {
    /// Create a worker that publishes into `library`
    pub fn new(config: MinerConfig, library: Arc<PatternLibrary>) -> Self {
        let interval = config.interval();
        Self {
            miner: PatternMiner::new(config),
            interval,
            library,
        }
    }

    /// The live library this worker publishes to
    pub fn library(&self) -> &Arc<PatternLibrary> {
        &self.library
    }

    /// Mine once: read new examples, mine, persist, publish
    ///
    /// Alongside the new examples, the newest `replay_window` earlier
    /// examples of every touched fingerprint are read for replay.
    ///
    /// Mining starts from whichever is newer, the persisted or the live
    /// version. In dry-run mode nothing is persisted or published.
    pub fn mine_once<S>(&mut self, store: &Mutex<S>) -> Result<MiningOutcome, MinerError>
    where
        S: TrainingLog + PatternRuleStore,
        <S as TrainingLog>::Error: Display,
        <S as PatternRuleStore>::Error: Display,
    {
        let (base, examples) = {
            let store = store
                .lock()
                .map_err(|e| MinerError::Store(format!("Store lock error: {}", e)))?;
            let stored = store
                .load_latest()
                .map_err(|e| MinerError::Store(e.to_string()))?;
            let live = self.library.current();
            let base = if live.version > stored.version {
                (*live).clone()
            } else {
                stored
            };
            let fresh = store
                .examples_after(base.mined_through)
                .map_err(|e| MinerError::Store(e.to_string()))?;

            // earlier examples of each touched fingerprint, for replay
            let mut fingerprints: Vec<&Fingerprint> =
                fresh.iter().map(|e| e.fingerprint()).collect();
            fingerprints.sort();
            fingerprints.dedup();
            let mut examples = Vec::new();
            if self.miner.config().replay_window > 0 {
                for fingerprint in fingerprints {
                    let earlier = store
                        .examples_for_fingerprint(
                            fingerprint,
                            base.mined_through,
                            self.miner.config().replay_window,
                        )
                        .map_err(|e| MinerError::Store(e.to_string()))?;
                    examples.extend(earlier);
                }
            }
            examples.extend(fresh);
            (base, examples)
        };

        let outcome = self.miner.mine(&base, &examples, current_timestamp());
        if !outcome.has_new_version() {
            return Ok(outcome);
        }

        if self.miner.config().dry_run {
            tracing::info!(
                "DRY RUN: Would publish library v{} ({} active rules)",
                outcome.library.version,
                outcome.library.active_rule_count()
            );
            return Ok(outcome);
        }

        {
            let mut store = store
                .lock()
                .map_err(|e| MinerError::Store(format!("Store lock error: {}", e)))?;
            store
                .save_version(&outcome.library)
                .map_err(|e| MinerError::Store(e.to_string()))?;
        }

        if !self.library.publish(outcome.library.clone()) {
            return Err(MinerError::StaleVersion {
                mined: outcome.library.version,
                live: self.library.version(),
            });
        }
        self.miner.metrics_mut().record_published();

        Ok(outcome)
    }

    /// Run the worker indefinitely
    ///
    /// Mines at the configured interval until a shutdown signal (Ctrl+C) is
    /// received. A failed pass is logged and retried at the next tick.
    pub async fn run<S>(&mut self, store: Arc<Mutex<S>>) -> Result<(), MinerError>
    where
        S: TrainingLog + PatternRuleStore,
        <S as TrainingLog>::Error: Display,
        <S as PatternRuleStore>::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!("Miner worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting mining pass");

                    match self.mine_once(&store) {
                        Ok(outcome) if outcome.has_new_version() => {
                            tracing::info!(
                                "Mining pass completed: v{}, {} examples",
                                outcome.library.version,
                                outcome.examples_consumed
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!("Mining pass failed: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping miner");
                    break;
                }
            }
        }

        tracing::info!("Miner stopped. Final metrics:\n{}", self.metrics().summary());

        Ok(())
    }

    /// Run for a specific number of passes (useful for testing)
    pub async fn run_cycles<S>(
        &mut self,
        store: Arc<Mutex<S>>,
        cycles: usize,
    ) -> Result<(), MinerError>
    where
        S: TrainingLog + PatternRuleStore,
        <S as TrainingLog>::Error: Display,
        <S as PatternRuleStore>::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Miner worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting mining pass {}/{}", cycle + 1, cycles);

            if let Err(e) = self.mine_once(&store) {
                tracing::error!("Mining pass {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Miner finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics().summary()
        );

        Ok(())
    }

    /// Get a reference to the miner's current metrics
    pub fn metrics(&self) -> &MinerMetrics {
        self.miner.metrics()
    }

    /// Reset the miner's metrics counters
    pub fn reset_metrics(&mut self) {
        self.miner.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mise_domain::{
        Confidence, DraftId, FieldName, FieldValue, Fingerprint, MergedRecipeDraft,
        NewTrainingExample, PatternLibraryVersion, StepEntry,
    };
    use mise_store::SqliteStore;

    fn store_with_example() -> Arc<Mutex<SqliteStore>> {
        let mut store = SqliteStore::in_memory().unwrap();
        let original = MergedRecipeDraft::empty(DraftId::new("d"), 0, Fingerprint::new("fp"), 0);
        let mut corrected = original.clone();
        let title = FieldValue::Text("Brot".into());
        corrected.set_field(FieldName::Title, Some(title), Confidence::CERTAIN, None);
        corrected.set_field(
            FieldName::Steps,
            Some(FieldValue::Steps(vec![StepEntry {
                text: "Kneten".into(),
                confidence: Confidence::CERTAIN,
            }])),
            Confidence::CERTAIN,
            None,
        );
        store
            .append(NewTrainingExample::from_review(&original, corrected, "Brot\n1. Kneten", 0))
            .unwrap();
        Arc::new(Mutex::new(store))
    }

    fn config() -> MinerConfig {
        MinerConfig {
            interval_minutes: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = MinerWorker::new(config(), Arc::new(PatternLibrary::empty()));
        assert_eq!(worker.metrics().runs, 0);
    }

    #[tokio::test]
    async fn test_run_cycles_publishes_and_persists() {
        let store = store_with_example();
        let library = Arc::new(PatternLibrary::empty());
        let mut worker = MinerWorker::new(config(), Arc::clone(&library));

        worker.run_cycles(Arc::clone(&store), 1).await.unwrap();

        assert_eq!(worker.metrics().runs, 1);
        assert_eq!(worker.metrics().versions_published, 1);
        assert_eq!(library.version(), 1);
        let persisted = store.lock().unwrap().load_latest().unwrap();
        assert_eq!(persisted.version, 1);
        assert_eq!(persisted.rules.len(), 1);
    }

    #[test]
    fn test_second_pass_without_new_examples_is_a_noop() {
        let store = store_with_example();
        let library = Arc::new(PatternLibrary::empty());
        let mut worker = MinerWorker::new(config(), Arc::clone(&library));

        assert!(worker.mine_once(&store).unwrap().has_new_version());
        let second = worker.mine_once(&store).unwrap();
        assert!(!second.has_new_version());
        assert_eq!(library.version(), 1);
        assert_eq!(worker.metrics().runs, 2);
        assert_eq!(worker.metrics().versions_published, 1);
    }

    #[test]
    fn test_second_pass_replays_earlier_examples() {
        let store = store_with_example();
        let library = Arc::new(PatternLibrary::empty());
        let mut worker = MinerWorker::new(config(), Arc::clone(&library));
        worker.mine_once(&store).unwrap();

        let repeat = store.lock().unwrap().examples_after(0).unwrap().remove(0).example;
        store.lock().unwrap().append(repeat).unwrap();

        let outcome = worker.mine_once(&store).unwrap();
        assert_eq!(outcome.examples_consumed, 1);
        assert_eq!(outcome.revised, vec![1]);
        assert_eq!((outcome.replayed, outcome.reproduced, outcome.regressed), (1, 1, 0));
    }

    #[test]
    fn test_dry_run_neither_persists_nor_publishes() {
        let store = store_with_example();
        let library = Arc::new(PatternLibrary::empty());
        let mut worker = MinerWorker::new(
            MinerConfig {
                dry_run: true,
                ..config()
            },
            Arc::clone(&library),
        );

        let outcome = worker.mine_once(&store).unwrap();
        assert_eq!(outcome.library.version, 1);
        assert_eq!(library.version(), 0);
        assert_eq!(store.lock().unwrap().load_latest().unwrap().version, 0);
    }

    #[test]
    fn test_mining_starts_from_newer_live_version() {
        let store = store_with_example();
        let library = Arc::new(PatternLibrary::new(PatternLibraryVersion {
            version: 5,
            ..Default::default()
        }));
        let mut worker = MinerWorker::new(config(), Arc::clone(&library));

        let outcome = worker.mine_once(&store).unwrap();
        assert_eq!(outcome.library.version, 6);
        assert_eq!(library.version(), 6);
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let mut worker = MinerWorker::new(config(), Arc::new(PatternLibrary::empty()));
        worker.run_cycles(store_with_example(), 1).await.unwrap();
        assert_eq!(worker.metrics().runs, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().runs, 0);
    }
}
