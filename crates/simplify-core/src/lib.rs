//! Legal document simplification pipeline
//!
//! Extraction, chunking, LLM simplification, clause detection and report
//! aggregation, wired together by [`Pipeline`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use simplify_core::{GeminiClient, Pipeline, PipelineConfig};
//! use shared_types::Document;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load(None)?;
//! let client = GeminiClient::new(config.llm.clone())?;
//! let pipeline = Pipeline::with_service(config, Arc::new(client))?;
//!
//! let bytes = std::fs::read("lease.pdf")?;
//! let report = pipeline.analyze(Document::new("lease.pdf", bytes)).await?;
//! println!("{} clauses, status {:?}", report.clauses.len(), report.status);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod chunker;
pub mod cleanup;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod simplifier;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use aggregator::{aggregate, AggregationError, AggregationInput};
pub use chunker::{chunk_text, ChunkError};
pub use config::{
    ChunkingConfig, ConfigError, LimitsConfig, LlmConfig, PipelineConfig, SimplifierConfig,
};
pub use doc_extract::ExtractError;
pub use llm::{CompletionRequest, CompletionService, GeminiClient, LlmError};
pub use pipeline::{CancelMode, Pipeline, PipelineError};
pub use simplifier::{rate_limiter, SharedRateLimiter, Simplifier};
