use serde::{Deserialize, Serialize};

use crate::clause::{ClauseMatch, Deadline};
use crate::document::DocumentFormat;
use crate::segment::TextSegment;
use crate::text::Span;

/// Bounded unit of text submitted in one simplification request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    /// Range this chunk is responsible for in the reassembled output
    pub primary: Span,
    /// Primary range plus the overlap lead-in from the previous chunk
    pub context: Span,
    /// Text of `context`
    pub text: String,
}

impl Chunk {
    /// Lead-in text shared with the previous chunk (empty for the first)
    pub fn lead_in(&self) -> &str {
        &self.text[..self.primary.start - self.context.start]
    }

    /// Text of the primary range
    pub fn primary_text(&self) -> &str {
        &self.text[self.primary.start - self.context.start..]
    }
}

/// Why a chunk could not be simplified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every attempt failed with a transient error (network, rate limit,
    /// timeout, malformed output)
    ServiceUnavailable(String),
    /// The service rejected the request outright
    Rejected(String),
    /// The request was cancelled before the chunk completed
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ServiceUnavailable(detail) => write!(f, "service unavailable: {}", detail),
            FailureReason::Rejected(detail) => write!(f, "rejected: {}", detail),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChunkOutcome {
    Simplified { text: String, attempts: u32 },
    Failed { reason: FailureReason, attempts: u32 },
}

/// Simplifier output for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplificationResult {
    pub chunk_index: usize,
    pub primary: Span,
    pub outcome: ChunkOutcome,
}

impl SimplificationResult {
    pub fn simplified(chunk: &Chunk, text: String, attempts: u32) -> Self {
        Self {
            chunk_index: chunk.index,
            primary: chunk.primary,
            outcome: ChunkOutcome::Simplified { text, attempts },
        }
    }

    pub fn failed(chunk: &Chunk, reason: FailureReason, attempts: u32) -> Self {
        Self {
            chunk_index: chunk.index,
            primary: chunk.primary,
            outcome: ChunkOutcome::Failed { reason, attempts },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Simplified { .. })
    }
}

/// Provenance of one chunk's contribution to the simplified document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedSection {
    pub chunk_index: usize,
    pub primary: Span,
    /// Simplified text, `None` if the chunk failed
    pub text: Option<String>,
    pub failure: Option<FailureReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedDocument {
    pub text: String,
    pub sections: Vec<SimplifiedSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportStatus {
    Complete,
    Partial { failed_chunks: Vec<usize> },
    Failed { failed_chunks: Vec<usize> },
}

impl ReportStatus {
    /// Status from the total chunk count and the indices that failed
    pub fn from_failures(total_chunks: usize, failed_chunks: Vec<usize>) -> Self {
        if failed_chunks.is_empty() {
            ReportStatus::Complete
        } else if failed_chunks.len() < total_chunks {
            ReportStatus::Partial { failed_chunks }
        } else {
            ReportStatus::Failed { failed_chunks }
        }
    }

    pub fn failed_chunks(&self) -> &[usize] {
        match self {
            ReportStatus::Complete => &[],
            ReportStatus::Partial { failed_chunks } | ReportStatus::Failed { failed_chunks } => {
                failed_chunks
            }
        }
    }
}

/// Final side-by-side output for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: String,
    pub filename: String,
    pub format: DocumentFormat,
    pub original_text: String,
    pub segments: Vec<TextSegment>,
    pub simplified: SimplifiedDocument,
    pub clauses: Vec<ClauseMatch>,
    pub deadlines: Vec<Deadline>,
    pub insights: Vec<String>,
    pub status: ReportStatus,
    pub generated_at: u64,
}

impl AnalysisReport {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn timestamp_now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }
}
