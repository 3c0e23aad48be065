//! Document pipeline: segment, run the strategy chain, merge

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::fingerprint;
use crate::generative::{GenerativeFallback, NoProvider};
use crate::library::PatternLibrary;
use crate::merger::{best_confidence, ConfidenceMerger};
use crate::pattern::PatternStrategy;
use crate::segmenter::Segmenter;
use crate::strategy::{heuristic_strategy, ParseContext, Strategy};
use crate::types::{ParsedDocument, ParsedSegment, SourceDocument};
use mise_domain::traits::CompletionProvider;
use mise_domain::{
    DocumentState, DraftId, FieldName, Fingerprint, MergedRecipeDraft, PatternLibraryVersion,
    Segment,
};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Turns documents into merged recipe drafts
///
/// Local strategies run in priority order (pattern, then heuristic); the
/// generative fallback only runs when a provider is attached.
pub struct Extractor<P = NoProvider> {
    config: Arc<ExtractorConfig>,
    library: Arc<PatternLibrary>,
    segmenter: Segmenter,
    strategies: Arc<[Box<dyn Strategy>]>,
    fallback: Option<Arc<GenerativeFallback<P>>>,
}

impl Extractor<NoProvider> {
    /// Create an Extractor without a generative fallback
    pub fn new(config: ExtractorConfig, library: Arc<PatternLibrary>) -> Self {
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(PatternStrategy),
            heuristic_strategy(config.heuristic_version, config.heuristic.clone()),
        ];
        Self {
            segmenter: Segmenter::from_config(&config),
            config: Arc::new(config),
            library,
            strategies: strategies.into(),
            fallback: None,
        }
    }

    /// Attach a completion provider for the generative fallback
    pub fn with_provider<Q>(self, provider: Q) -> Extractor<Q>
    where
        Q: CompletionProvider + Send + Sync + 'static,
        Q::Error: Display,
    {
        let fallback = GenerativeFallback::new(Arc::new(provider), &self.config);
        Extractor {
            config: self.config,
            library: self.library,
            segmenter: self.segmenter,
            strategies: self.strategies,
            fallback: Some(Arc::new(fallback)),
        }
    }
}

impl<P> Extractor<P>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: Display,
{
    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Live pattern library handle
    pub fn library(&self) -> &Arc<PatternLibrary> {
        &self.library
    }

    /// Parse a whole document
    ///
    /// Segments run concurrently against one library snapshot. Unsupported
    /// input fails the document; fallback problems never do.
    pub async fn parse_document(
        &self,
        document: SourceDocument,
    ) -> Result<ParsedDocument, ExtractorError> {
        if document.text.len() > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                document.text.len(),
                self.config.max_text_length,
            ));
        }

        let mut state = DocumentState::Uploaded;
        info!(
            "Parsing document {} ({} bytes, {} hints)",
            document.document_id,
            document.text.len(),
            document.boundary_hints.len()
        );

        let segments = match self.segmenter.segment(&document.text, &document.boundary_hints) {
            Ok(segments) => segments,
            Err(e) => {
                let failed = state.transition(DocumentState::Failed)?;
                warn!("Document {} {}: {}", document.document_id, failed, e);
                return Err(e.into());
            }
        };
        state = state.transition(DocumentState::Segmented)?;

        let fingerprint = document
            .fingerprint
            .unwrap_or_else(|| fingerprint::compute(&document.text));
        let worker = Arc::new(self.worker(fingerprint.clone(), self.library.current()));
        let library_version = worker.library.version;
        debug!(
            "Document {}: {} segments, fingerprint {}, library v{}",
            document.document_id,
            segments.len(),
            fingerprint,
            library_version
        );

        let mut tasks = JoinSet::new();
        for segment in segments {
            let worker = Arc::clone(&worker);
            tasks.spawn(async move { worker.run(segment).await });
        }

        let mut parsed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            parsed.push(joined.map_err(|e| ExtractorError::Worker(e.to_string()))?);
        }
        parsed.sort_by_key(|p| p.segment.index);
        state = state.transition(DocumentState::Parsed)?;

        let review = parsed.iter().any(|p| !p.draft.review_fields.is_empty());
        state = state.transition(if review {
            DocumentState::ReviewPending
        } else {
            DocumentState::Committed
        })?;

        info!(
            "Document {} parsed: {} drafts, state {}",
            document.document_id,
            parsed.len(),
            state
        );

        Ok(ParsedDocument {
            document_id: document.document_id,
            fingerprint,
            library_version,
            state,
            segments: parsed,
        })
    }

    /// Parse a document unless `cancel` fires first
    ///
    /// Cancellation drops every in-flight segment task; nothing partial is
    /// returned.
    pub async fn parse_document_with_cancel(
        &self,
        document: SourceDocument,
        cancel: CancellationToken,
    ) -> Result<ParsedDocument, ExtractorError> {
        let document_id = document.document_id;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Document {} parse cancelled", document_id);
                Err(ExtractorError::Cancelled)
            }
            result = self.parse_document(document) => result,
        }
    }

    /// Run the chain on one segment against the current library version
    pub async fn parse_segment(
        &self,
        segment: Segment,
        fingerprint: &Fingerprint,
    ) -> ParsedSegment {
        self.worker(fingerprint.clone(), self.library.current())
            .run(segment)
            .await
    }

    fn worker(
        &self,
        fingerprint: Fingerprint,
        library: Arc<PatternLibraryVersion>,
    ) -> SegmentWorker<P> {
        SegmentWorker {
            config: Arc::clone(&self.config),
            strategies: Arc::clone(&self.strategies),
            fallback: self.fallback.clone(),
            merger: ConfidenceMerger::new(self.config.confidence_floor),
            fingerprint,
            library,
        }
    }
}

/// Everything one parse shares across its segment tasks
struct SegmentWorker<P> {
    config: Arc<ExtractorConfig>,
    strategies: Arc<[Box<dyn Strategy>]>,
    fallback: Option<Arc<GenerativeFallback<P>>>,
    merger: ConfidenceMerger,
    fingerprint: Fingerprint,
    library: Arc<PatternLibraryVersion>,
}

impl<P> SegmentWorker<P>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: Display,
{
    async fn run(&self, segment: Segment) -> ParsedSegment {
        let mut candidates = {
            let ctx = ParseContext {
                fingerprint: &self.fingerprint,
                library: &self.library,
                locale: self.config.locale,
            };
            self.strategies
                .iter()
                .flat_map(|strategy| strategy.parse(&segment, &ctx))
                .collect::<Vec<_>>()
        };

        let fallback_fields: Vec<FieldName> = FieldName::ALL
            .into_iter()
            .filter(|field| self.config.fallback_fields.contains(field))
            .filter(|field| {
                best_confidence(&candidates, *field).value() < self.config.generative_threshold
            })
            .collect();

        let mut fallback_error = None;
        if let (Some(fallback), false) = (&self.fallback, fallback_fields.is_empty()) {
            match fallback.complete(&segment, &fallback_fields).await {
                Ok(generated) => candidates.extend(generated),
                Err(e) => {
                    warn!(
                        "Segment {}: generative fallback failed, {:?} stay low-confidence: {}",
                        segment.index, fallback_fields, e
                    );
                    fallback_error = Some(e.to_string());
                }
            }
        }

        let draft = MergedRecipeDraft::empty(
            draft_id(&self.fingerprint, &segment),
            segment.index,
            self.fingerprint.clone(),
            self.library.version,
        );
        let draft = self.merger.merge(draft, &candidates);
        debug!(
            "Segment {}: {} candidates, draft {} is {}",
            segment.index,
            candidates.len(),
            draft.draft_id,
            draft.overall_state.as_str()
        );

        ParsedSegment {
            segment,
            draft,
            candidates,
            fallback_fields,
            fallback_error,
        }
    }
}

/// Content-derived draft id: same fingerprint and segment, same id
fn draft_id(fingerprint: &Fingerprint, segment: &Segment) -> DraftId {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_str().as_bytes());
    hasher.update(segment.offset_range.start.to_le_bytes());
    hasher.update(segment.offset_range.end.to_le_bytes());
    hasher.update(segment.raw_text.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(32);
    DraftId::new(hex)
}
