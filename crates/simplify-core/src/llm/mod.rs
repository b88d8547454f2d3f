//! Text-completion service port
//!
//! The simplifier talks to the language model only through
//! [`CompletionService`], so the provider can be swapped or scripted in tests.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One completion call: a fixed instruction plus the text to work on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instruction: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider returned no text")]
    EmptyResponse,

    #[error("no API key configured")]
    MissingApiKey,
}

impl LlmError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport(_)
            | LlmError::Timeout
            | LlmError::RateLimited { .. }
            | LlmError::InvalidResponse(_)
            | LlmError::EmptyResponse => true,
            LlmError::Status { code, .. } => *code >= 500 || *code == 408 || *code == 429,
            LlmError::MissingApiKey => false,
        }
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
