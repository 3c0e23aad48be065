//! Reviewer corrections into the learning log

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, LearningPersistenceError};
use crate::types::ParsedDocument;
use mise_domain::traits::TrainingLog;
use mise_domain::{Correction, DocumentState, DraftId, NewTrainingExample, TrainingExample};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// What happened to a batch of corrections
#[derive(Debug, Default)]
pub struct CorrectionReport {
    /// Examples now in the log, in submission order
    pub recorded: Vec<TrainingExample>,
    /// Corrections applied to the document but lost to the log
    pub dropped: Vec<(DraftId, LearningPersistenceError)>,
}

/// Applies corrections to a parsed document and logs one training example each
///
/// Logging is best-effort: a correction that cannot be appended after the
/// configured attempts is dropped and reported, and the document still
/// moves on.
pub struct CorrectionRecorder<L> {
    log: Arc<Mutex<L>>,
    max_attempts: u32,
    backoff: Duration,
    floor: f64,
}

impl<L> CorrectionRecorder<L>
where
    L: TrainingLog + Send + 'static,
    L::Error: Display,
{
    /// Create a recorder owning the log
    pub fn new(log: L, config: &ExtractorConfig) -> Self {
        Self::shared(Arc::new(Mutex::new(log)), config)
    }

    /// Create a recorder over a log shared with other components
    pub fn shared(log: Arc<Mutex<L>>, config: &ExtractorConfig) -> Self {
        Self {
            log,
            max_attempts: config.learning_max_attempts.max(1),
            backoff: config.learning_backoff(),
            floor: config.confidence_floor,
        }
    }

    /// The underlying log
    pub fn log(&self) -> &Arc<Mutex<L>> {
        &self.log
    }

    /// Apply `corrections` and archive the document
    ///
    /// The document must be awaiting review. Every correction must name a
    /// draft of this document; nothing is changed otherwise.
    pub async fn submit(
        &self,
        document: &mut ParsedDocument,
        corrections: Vec<Correction>,
    ) -> Result<CorrectionReport, ExtractorError> {
        if let Some(unknown) = corrections
            .iter()
            .find(|c| document.find_draft(&c.draft_id).is_none())
        {
            return Err(ExtractorError::UnknownDraft(unknown.draft_id.to_string()));
        }

        let corrected_state = document.state.transition(DocumentState::Corrected)?;
        document.state = corrected_state;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut report = CorrectionReport::default();
        for correction in corrections {
            let Some(parsed) = document
                .segments
                .iter_mut()
                .find(|s| s.draft.draft_id == correction.draft_id)
            else {
                continue;
            };

            let corrected = parsed.draft.apply_correction(&correction, self.floor);
            let example = NewTrainingExample::from_review(
                &parsed.draft,
                corrected.clone(),
                parsed.segment.raw_text.clone(),
                created_at,
            );
            parsed.draft = corrected;

            match self.append_with_retry(example).await {
                Ok(stored) => {
                    info!(
                        "Recorded correction of draft {} as training example {} \
                         ({} changed fields)",
                        correction.draft_id,
                        stored.id,
                        stored.example.diff.changes.len()
                    );
                    report.recorded.push(stored);
                }
                Err(e) => {
                    error!("Dropping correction of draft {}: {}", correction.draft_id, e);
                    report.dropped.push((correction.draft_id, e));
                }
            }
        }

        document.state = document.state.transition(DocumentState::Archived)?;
        Ok(report)
    }

    async fn append_with_retry(
        &self,
        example: NewTrainingExample,
    ) -> Result<TrainingExample, LearningPersistenceError> {
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            let log = Arc::clone(&self.log);
            let pending = example.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut log = log
                    .lock()
                    .map_err(|e| format!("Learning log lock error: {}", e))?;
                log.append(pending).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| format!("Task join error: {}", e))
            .and_then(|r| r);

            match result {
                Ok(stored) => return Ok(stored),
                Err(message) if attempt < self.max_attempts => {
                    warn!(
                        "Learning log append attempt {} failed, retrying in {:?}: {}",
                        attempt, delay, message
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(message) => {
                    return Err(LearningPersistenceError {
                        attempts: attempt,
                        message,
                    })
                }
            }
        }
    }
}
