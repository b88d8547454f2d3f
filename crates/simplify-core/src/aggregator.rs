//! Merges per-chunk results and clause analysis into an [`AnalysisReport`]

use clause_engine::ClauseAnalysis;
use shared_types::{
    AnalysisReport, Chunk, ChunkOutcome, DocumentFormat, ExtractedText, ReportStatus,
    SimplificationResult, SimplifiedDocument, SimplifiedSection, Span,
};
use thiserror::Error;
use tracing::info;

use crate::cleanup::clean_output;

/// Placeholder written into the simplified text for a failed chunk
pub const FAILED_SECTION_NOTICE: &str =
    "[This section could not be simplified. Please refer to the original text.]";

/// Broken invariant between pipeline stages
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("no result for chunk {0}")]
    MissingResult(usize),

    #[error("more than one result for chunk {0}")]
    DuplicateResult(usize),

    #[error("result for unknown chunk {0}")]
    UnknownChunk(usize),

    #[error("chunk {chunk} primary range {found:?} does not match {expected:?}")]
    PrimaryMismatch {
        chunk: usize,
        expected: Span,
        found: Span,
    },

    #[error("chunk primaries do not tile the text: gap or overlap at byte {0}")]
    Coverage(usize),

    #[error("span {0:?} lies outside the extracted text")]
    SpanOutOfBounds(Span),
}

pub struct AggregationInput {
    pub filename: String,
    pub format: DocumentFormat,
    pub extracted: ExtractedText,
    pub chunks: Vec<Chunk>,
    pub results: Vec<SimplificationResult>,
    pub analysis: ClauseAnalysis,
}

pub fn aggregate(input: AggregationInput) -> Result<AnalysisReport, AggregationError> {
    let AggregationInput {
        filename,
        format,
        extracted,
        chunks,
        mut results,
        analysis,
    } = input;

    check_coverage(&chunks, extracted.text.len())?;
    check_spans(&analysis, &extracted.text)?;

    results.sort_by_key(|r| r.chunk_index);
    for pair in results.windows(2) {
        if pair[0].chunk_index == pair[1].chunk_index {
            return Err(AggregationError::DuplicateResult(pair[0].chunk_index));
        }
    }
    if let Some(extra) = results.iter().find(|r| r.chunk_index >= chunks.len()) {
        return Err(AggregationError::UnknownChunk(extra.chunk_index));
    }

    let mut sections = Vec::with_capacity(chunks.len());
    let mut failed_chunks = Vec::new();
    for (chunk, result) in chunks.iter().zip(results.iter()) {
        if result.chunk_index != chunk.index {
            return Err(AggregationError::MissingResult(chunk.index));
        }
        if result.primary != chunk.primary {
            return Err(AggregationError::PrimaryMismatch {
                chunk: chunk.index,
                expected: chunk.primary,
                found: result.primary,
            });
        }

        sections.push(match &result.outcome {
            ChunkOutcome::Simplified { text, .. } => SimplifiedSection {
                chunk_index: chunk.index,
                primary: chunk.primary,
                text: Some(clean_output(text)),
                failure: None,
            },
            ChunkOutcome::Failed { reason, .. } => {
                failed_chunks.push(chunk.index);
                SimplifiedSection {
                    chunk_index: chunk.index,
                    primary: chunk.primary,
                    text: None,
                    failure: Some(reason.clone()),
                }
            }
        });
    }
    if results.len() < chunks.len() {
        return Err(AggregationError::MissingResult(results.len()));
    }

    let text = sections
        .iter()
        .map(|s| s.text.as_deref().unwrap_or(FAILED_SECTION_NOTICE))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let status = ReportStatus::from_failures(chunks.len(), failed_chunks);
    info!(
        filename = %filename,
        chunks = chunks.len(),
        failed = status.failed_chunks().len(),
        clauses = analysis.clauses.len(),
        "Aggregated analysis report"
    );

    Ok(AnalysisReport {
        id: AnalysisReport::new_id(),
        filename,
        format,
        original_text: extracted.text,
        segments: extracted.segments,
        simplified: SimplifiedDocument { text, sections },
        clauses: analysis.clauses,
        deadlines: analysis.deadlines,
        insights: analysis.insights,
        status,
        generated_at: AnalysisReport::timestamp_now(),
    })
}

fn check_coverage(chunks: &[Chunk], text_len: usize) -> Result<(), AggregationError> {
    let mut expected = 0;
    for chunk in chunks {
        if chunk.primary.start != expected {
            return Err(AggregationError::Coverage(expected));
        }
        expected = chunk.primary.end;
    }
    if !chunks.is_empty() && expected != text_len {
        return Err(AggregationError::Coverage(expected));
    }
    Ok(())
}

fn check_spans(analysis: &ClauseAnalysis, text: &str) -> Result<(), AggregationError> {
    let spans = analysis
        .clauses
        .iter()
        .flat_map(|c| [c.span, c.keyword_span])
        .chain(analysis.deadlines.iter().map(|d| d.span));
    for span in spans {
        if !span.is_valid_in(text) {
            return Err(AggregationError::SpanOutOfBounds(span));
        }
    }
    Ok(())
}
