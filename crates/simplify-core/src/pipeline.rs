//! Document analysis pipeline
//!
//! ```text
//!              ┌──────────────┐   ┌─────────┐   ┌───────────────────────┐
//! Document ──► │  extraction  │──►│ chunker │──►│ simplifier (N at once)│──┐
//!              │ (blocking)   │   └─────────┘   └───────────────────────┘  │
//!              └──────┬───────┘                                            ▼
//!                     │            ┌──────────────────────┐         ┌────────────┐
//!                     └──────────► │ clause detection     │───────► │ aggregator │──► AnalysisReport
//!                                  │ (blocking, parallel) │         └────────────┘
//!                                  └──────────────────────┘
//! ```

use clause_engine::{ClauseDetector, ClauseError, ClauseRuleSet};
use doc_extract::{ExtractError, Extractor};
use futures::future::{self, Future};
use futures::stream::{self, StreamExt};
use shared_types::{AnalysisReport, Document, FailureReason, SimplificationResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::aggregator::{aggregate, AggregationError, AggregationInput};
use crate::chunker::{chunk_text, ChunkError};
use crate::config::PipelineConfig;
use crate::llm::CompletionService;
use crate::simplifier::{rate_limiter, SharedRateLimiter, Simplifier};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document is {size} bytes, the limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error("text extraction timed out after {0:?}")]
    ExtractionTimeout(Duration),

    #[error("analysis was cancelled")]
    Cancelled,

    #[error("internal aggregation error: {0}")]
    InternalAggregation(#[from] AggregationError),

    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Clause(#[from] ClauseError),
}

/// What to do when an analysis is cancelled mid-simplification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Report what finished; unfinished chunks are marked cancelled
    BestEffort,
    /// Discard everything and return [`PipelineError::Cancelled`]
    Abort,
}

pub struct Pipeline {
    extractor: Arc<Extractor>,
    detector: Arc<ClauseDetector>,
    simplifier: Simplifier,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build with an explicit completion service and shared rate limiter
    pub fn new(
        config: PipelineConfig,
        service: Arc<dyn CompletionService>,
        limiter: SharedRateLimiter,
    ) -> Result<Self, PipelineError> {
        let rules = ClauseRuleSet::default().with_overrides(&config.clauses);
        let detector = ClauseDetector::new(rules)?;
        let simplifier = Simplifier::new(service, limiter, config.simplifier.clone());

        Ok(Self {
            extractor: Arc::new(Extractor::with_max_decompressed_bytes(
                config.limits.max_decompressed_bytes,
            )),
            detector: Arc::new(detector),
            simplifier,
            config,
        })
    }

    /// Build with a rate limiter sized from `config.simplifier`
    pub fn with_service(
        config: PipelineConfig,
        service: Arc<dyn CompletionService>,
    ) -> Result<Self, PipelineError> {
        let limiter = rate_limiter(config.simplifier.requests_per_second);
        Self::new(config, service, limiter)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline to completion
    pub async fn analyze(&self, document: Document) -> Result<AnalysisReport, PipelineError> {
        self.analyze_until(document, future::pending::<()>(), CancelMode::Abort)
            .await
    }

    /// Run the pipeline, stopping simplification when `cancel` resolves
    #[instrument(skip(self, document, cancel), fields(filename = %document.filename(), bytes = document.len()))]
    pub async fn analyze_until<C>(
        &self,
        document: Document,
        cancel: C,
        mode: CancelMode,
    ) -> Result<AnalysisReport, PipelineError>
    where
        C: Future<Output = ()> + Send,
    {
        let limit = self.config.limits.max_document_bytes;
        if document.len() > limit {
            return Err(PipelineError::DocumentTooLarge {
                size: document.len(),
                limit,
            });
        }

        let filename = document.filename().to_string();
        let format = document.format().clone();

        let timeout = self.config.limits.extraction_timeout();
        let extractor = Arc::clone(&self.extractor);
        let extraction =
            tokio::task::spawn_blocking(move || extractor.extract(&document));
        let extracted = match tokio::time::timeout(timeout, extraction).await {
            Err(_) => return Err(PipelineError::ExtractionTimeout(timeout)),
            Ok(joined) => joined.map_err(|e| PipelineError::Task(e.to_string()))??,
        };

        let chunks = chunk_text(&extracted.text, &self.config.chunking)?;
        info!(
            segments = extracted.segments.len(),
            chunks = chunks.len(),
            "Document extracted and chunked"
        );

        let detector = Arc::clone(&self.detector);
        let detect_text = extracted.text.clone();
        let detection = tokio::task::spawn_blocking(move || detector.analyze(&detect_text));

        let pending: Vec<_> = chunks
            .iter()
            .map(|chunk| self.simplifier.simplify_chunk(chunk))
            .collect();
        let simplification = stream::iter(pending)
            .buffer_unordered(self.config.simplifier.concurrency.max(1))
            .take_until(cancel)
            .collect::<Vec<SimplificationResult>>();

        let (mut results, detection) = tokio::join!(simplification, detection);
        let analysis = detection.map_err(|e| PipelineError::Task(e.to_string()))?;

        if results.len() < chunks.len() {
            let finished: BTreeSet<usize> = results.iter().map(|r| r.chunk_index).collect();
            warn!(
                finished = finished.len(),
                total = chunks.len(),
                ?mode,
                "Analysis cancelled before all chunks were simplified"
            );
            if mode == CancelMode::Abort {
                return Err(PipelineError::Cancelled);
            }
            results.extend(
                chunks
                    .iter()
                    .filter(|c| !finished.contains(&c.index))
                    .map(|c| SimplificationResult::failed(c, FailureReason::Cancelled, 0)),
            );
        }

        let report = aggregate(AggregationInput {
            filename,
            format,
            extracted,
            chunks,
            results,
            analysis,
        })?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::PRIMARY_MARKER;
    use crate::llm::LlmError;
    use crate::testing::{echo, primary_from_prompt, Reply, ScriptedCompletion};
    use doc_extract::fixtures;
    use pretty_assertions::assert_eq;
    use shared_types::{ClauseCategory, ReportStatus};

    fn test_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.simplifier.retry_backoff_base_ms = 1;
        config.simplifier.max_backoff_ms = 2;
        config.simplifier.requests_per_second = 1000;
        config
    }

    fn pipeline(config: PipelineConfig, service: ScriptedCompletion) -> Pipeline {
        Pipeline::with_service(config, Arc::new(service)).unwrap()
    }

    const TERMINATION: &str = "This agreement may be terminated by either party with 30 days notice.";

    #[tokio::test]
    async fn test_two_page_pdf_end_to_end() {
        let pdf = fixtures::pdf_with_pages(&[
            "Whereas the parties wish to enter into this Master Services Agreement hereinafter.",
            TERMINATION,
        ]);
        let service = ScriptedCompletion::always(Reply::Text(format!(
            "{}\nThe parties want to sign this agreement. Pursuant to it, hereinafter either side can end it with 30 days notice.",
            PRIMARY_MARKER
        )));

        let report = pipeline(test_config(), service)
            .analyze(Document::new("msa.pdf", pdf))
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Complete);
        assert_eq!(report.segments.len(), 2);

        let termination = report
            .clauses
            .iter()
            .find(|c| c.category == ClauseCategory::Termination)
            .expect("termination clause");
        assert!(termination.text.contains(TERMINATION));
        assert_eq!(
            termination.span.slice(&report.original_text),
            Some(termination.text.as_str())
        );

        let simplified = report.simplified.text.to_lowercase();
        assert!(!simplified.contains(&PRIMARY_MARKER.to_lowercase()));
        for jargon in ["whereas", "hereinafter", "pursuant to"] {
            assert!(!simplified.contains(jargon), "leftover {:?}", jargon);
        }
    }

    #[tokio::test]
    async fn test_failed_middle_chunk_gives_partial_report() {
        let paragraphs = [
            "The Customer shall pay every invoice within thirty days of receipt by wire transfer.",
            "FAILME The Supplier is liable for direct damages caused by its own gross negligence only.",
            "Either party may terminate this agreement by written notice if the other party breaches it.",
        ];
        let docx = fixtures::docx_with_paragraphs(&paragraphs);

        let mut config = test_config();
        config.chunking.max_chunk_len = 100;
        config.chunking.chunk_overlap = 20;
        config.chunking.boundary_lookback = 100;

        let service = ScriptedCompletion::from_fn(|request| {
            if primary_from_prompt(&request.prompt).contains("FAILME") {
                Err(LlmError::Status {
                    code: 503,
                    body: "overloaded".to_string(),
                })
            } else {
                Ok(echo(request))
            }
        });

        let report = pipeline(config, service)
            .analyze(Document::new("contract.docx", docx))
            .await
            .unwrap();

        assert_eq!(report.simplified.sections.len(), 3);
        assert_eq!(report.status, ReportStatus::Partial { failed_chunks: vec![1] });
        assert!(report.simplified.sections[0].text.as_deref().unwrap().contains("invoice"));
        assert!(report.simplified.sections[2].text.as_deref().unwrap().contains("terminate"));
        assert!(matches!(
            report.simplified.sections[1].failure,
            Some(FailureReason::ServiceUnavailable(_))
        ));

        let categories: BTreeSet<_> = report.clauses.iter().map(|c| c.category).collect();
        assert!(categories.contains(&ClauseCategory::Payment));
        assert!(categories.contains(&ClauseCategory::Liability));
        assert!(categories.contains(&ClauseCategory::Termination));
    }

    #[tokio::test]
    async fn test_unmarked_reply_does_not_duplicate_overlap() {
        let paragraphs = [
            "The Customer shall pay every invoice within thirty days by wire transfer.",
            "Either party may terminate this agreement by written notice if the other party breaches it.",
        ];
        let docx = fixtures::docx_with_paragraphs(&paragraphs);

        let mut config = test_config();
        config.chunking.max_chunk_len = 100;
        config.chunking.chunk_overlap = 60;
        config.chunking.boundary_lookback = 100;

        // Rewrites context and primary together, with no marker to split them
        let service = ScriptedCompletion::from_fn(|request| {
            if request.prompt.contains("CONTEXT:") {
                Ok(format!("Plain: {}", request.prompt.replace(PRIMARY_MARKER, "")))
            } else {
                Ok(echo(request))
            }
        });

        let report = pipeline(config, service)
            .analyze(Document::new("contract.docx", docx))
            .await
            .unwrap();

        assert_eq!(report.simplified.sections.len(), 2);
        assert_eq!(report.status, ReportStatus::Partial { failed_chunks: vec![1] });
        assert_eq!(report.simplified.text.matches("wire transfer").count(), 1);
        assert!(matches!(
            &report.simplified.sections[1].failure,
            Some(FailureReason::ServiceUnavailable(detail)) if detail.contains("missing primary marker")
        ));
    }

    #[tokio::test]
    async fn test_unpunctuated_docx_paragraphs_are_separate_clauses() {
        let paragraphs = [
            "Payment of all fees to the Landlord",
            "Either party may terminate this lease with notice",
            "Late payment penalty of five percent",
        ];
        let docx = fixtures::docx_with_paragraphs(&paragraphs);
        let service = ScriptedCompletion::always(Reply::Echo);

        let report = pipeline(test_config(), service)
            .analyze(Document::new("lease.docx", docx))
            .await
            .unwrap();

        let payment: Vec<_> = report
            .clauses
            .iter()
            .filter(|c| c.category == ClauseCategory::Payment)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(payment, vec![paragraphs[0], paragraphs[2]]);

        let termination = report
            .clauses
            .iter()
            .find(|c| c.category == ClauseCategory::Termination)
            .expect("termination clause");
        assert_eq!(termination.text, paragraphs[1]);
    }

    #[tokio::test]
    async fn test_large_document_is_split_into_bounded_chunks() {
        let paragraph = "The Licensee shall pay the license fee within thirty days of each invoice date.";
        let paragraphs: Vec<&str> = std::iter::repeat(paragraph).take(60).collect();
        let docx = fixtures::docx_with_paragraphs(&paragraphs);

        let config = test_config();
        let max = config.chunking.max_chunk_len;
        let service = ScriptedCompletion::from_fn(|request| Ok(echo(request)));

        let report = pipeline(config, service)
            .analyze(Document::new("license.docx", docx))
            .await
            .unwrap();

        assert!(report.original_text.len() > max);
        assert!(report.simplified.sections.len() > 1);
        for section in &report.simplified.sections {
            assert!(section.primary.len() <= max);
        }
        assert_eq!(report.status, ReportStatus::Complete);
    }

    #[tokio::test]
    async fn test_empty_document_fails() {
        let docx = fixtures::docx_with_paragraphs(&["", ""]);
        let service = ScriptedCompletion::always(Reply::Echo);
        let result = pipeline(test_config(), service)
            .analyze(Document::new("blank.docx", docx))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Extract(ExtractError::EmptyDocument))
        ));
    }

    #[tokio::test]
    async fn test_oversized_document_is_rejected() {
        let mut config = test_config();
        config.limits.max_document_bytes = 10;
        let service = ScriptedCompletion::always(Reply::Echo);
        let result = pipeline(config, service)
            .analyze(Document::new("big.pdf", vec![b'%'; 11]))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::DocumentTooLarge { size: 11, limit: 10 })
        ));
    }

    #[tokio::test]
    async fn test_docx_expanding_past_limit_is_corrupt() {
        let filler = vec![""; 20_000];
        let docx = fixtures::docx_with_paragraphs(&filler);
        let mut config = test_config();
        config.limits.max_decompressed_bytes = 64 * 1024;
        assert!(docx.len() < config.limits.max_document_bytes);

        let service = ScriptedCompletion::always(Reply::Echo);
        let result = pipeline(config, service)
            .analyze(Document::new("bomb.docx", docx))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Extract(ExtractError::CorruptDocument(_)))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_format_fails() {
        let service = ScriptedCompletion::always(Reply::Echo);
        let result = pipeline(test_config(), service)
            .analyze(Document::new("notes.txt", b"hello".to_vec()))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Extract(ExtractError::UnsupportedFormat(_)))
        ));
    }

    fn slow_document() -> (PipelineConfig, Document) {
        let paragraph = "The Supplier shall deliver the goods and invoice the Customer for the agreed fee on time.";
        let paragraphs: Vec<&str> = std::iter::repeat(paragraph).take(6).collect();
        let mut config = test_config();
        config.chunking.max_chunk_len = 100;
        config.chunking.chunk_overlap = 10;
        config.simplifier.concurrency = 1;
        (
            config,
            Document::new("slow.docx", fixtures::docx_with_paragraphs(&paragraphs)),
        )
    }

    #[tokio::test]
    async fn test_best_effort_cancel_reports_finished_chunks() {
        let (config, document) = slow_document();
        let service = ScriptedCompletion::always(Reply::Echo).with_delay(Duration::from_millis(50));
        let pipeline = pipeline(config, service);

        let report = pipeline
            .analyze_until(
                document,
                tokio::time::sleep(Duration::from_millis(175)),
                CancelMode::BestEffort,
            )
            .await
            .unwrap();

        let sections = &report.simplified.sections;
        assert_eq!(sections.len(), 6);
        assert!(sections.iter().any(|s| s.text.is_some()));
        assert_eq!(sections[5].failure, Some(FailureReason::Cancelled));
        assert!(matches!(report.status, ReportStatus::Partial { .. }));
        assert!(!report.clauses.is_empty());
    }

    #[tokio::test]
    async fn test_abort_cancel_returns_error() {
        let (config, document) = slow_document();
        let service = ScriptedCompletion::always(Reply::Echo).with_delay(Duration::from_millis(50));
        let pipeline = pipeline(config, service);

        let result = pipeline
            .analyze_until(document, future::ready(()), CancelMode::Abort)
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_results_are_reassembled_in_chunk_order() {
        let (mut config, document) = slow_document();
        config.simplifier.concurrency = 4;
        let service = ScriptedCompletion::from_fn(|request| Ok(echo(request)));
        let report = pipeline(config, service).analyze(document).await.unwrap();

        let order: Vec<_> = report.simplified.sections.iter().map(|s| s.chunk_index).collect();
        assert_eq!(order, (0..order.len()).collect::<Vec<_>>());
        assert!(report
            .simplified
            .sections
            .iter()
            .all(|s| s.text.as_deref().is_some_and(|t| t.starts_with("Plain:"))));
    }
}
