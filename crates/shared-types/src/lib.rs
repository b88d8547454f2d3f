//! Types shared by the extraction, clause detection and simplification crates

pub mod clause;
pub mod document;
pub mod report;
pub mod segment;
pub mod text;

pub use clause::{ClauseCategory, ClauseMatch, Deadline, RiskLevel};
pub use document::{Document, DocumentFormat};
pub use report::{
    AnalysisReport, Chunk, ChunkOutcome, FailureReason, ReportStatus, SimplificationResult,
    SimplifiedDocument, SimplifiedSection,
};
pub use segment::{ExtractedText, SegmentSource, TextSegment};
pub use text::Span;
