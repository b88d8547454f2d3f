//! Per-chunk simplification with rate limiting and retries

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use shared_types::{Chunk, FailureReason, SimplificationResult};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::cleanup::{strip_lead_in, PRIMARY_MARKER};
use crate::config::SimplifierConfig;
use crate::llm::{CompletionRequest, CompletionService, LlmError};

/// Outbound request limiter shared by every simplifier in the process
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub fn rate_limiter(requests_per_second: u32) -> SharedRateLimiter {
    let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
}

pub const INSTRUCTION: &str = "You are an assistant specialized in simplifying legal language. \
Rewrite the legal text in clear, everyday English that a 10th-grade student can understand. \
Use short sentences, familiar words, and avoid complex sentence structures. \
Keep the original meaning and legal obligations intact and do not add anything that is not in the text. \
Preserve all numbers, dates, and percentages exactly. \
Highlight obligations, penalties, deadlines, and durations in plain terms. \
Return only the simplified text without any additional commentary.";

/// Shortest acceptable output for a primary text of `len` bytes
pub fn min_output_len(len: usize) -> usize {
    (len / 8).max(30)
}

pub struct Simplifier {
    service: Arc<dyn CompletionService>,
    limiter: SharedRateLimiter,
    config: SimplifierConfig,
}

impl Simplifier {
    pub fn new(
        service: Arc<dyn CompletionService>,
        limiter: SharedRateLimiter,
        config: SimplifierConfig,
    ) -> Self {
        Self {
            service,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &SimplifierConfig {
        &self.config
    }

    /// Prompt for one chunk. The overlap lead-in, if any, goes before the
    /// marker as context the model must not rewrite.
    pub fn build_request(&self, chunk: &Chunk) -> CompletionRequest {
        let lead_in = chunk.lead_in().trim();
        let primary = chunk.primary_text().trim();

        let prompt = if lead_in.is_empty() {
            format!(
                "Start your answer with the line {marker}.\n\n\
                 LEGAL TEXT:\n{marker}\n{primary}\n\nSIMPLIFIED TEXT:",
                marker = PRIMARY_MARKER,
                primary = primary
            )
        } else {
            format!(
                "The CONTEXT below only shows what came before and must not be rewritten. \
                 Simplify only the LEGAL TEXT after the line {marker}, \
                 and start your answer with the line {marker}.\n\n\
                 CONTEXT:\n{lead_in}\n\n\
                 LEGAL TEXT:\n{marker}\n{primary}\n\nSIMPLIFIED TEXT:",
                marker = PRIMARY_MARKER,
                lead_in = lead_in,
                primary = primary
            )
        };

        CompletionRequest {
            instruction: INSTRUCTION.to_string(),
            prompt,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32, error: &LlmError) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .config
            .retry_backoff_base()
            .saturating_mul(1u32 << exponent)
            .min(self.config.max_backoff());

        match error {
            LlmError::RateLimited {
                retry_after: Some(after),
            } => delay.max(*after).min(self.config.max_backoff()),
            _ => delay,
        }
    }

    /// Reject replies that are too short, or that cannot be separated from
    /// the rewritten lead-in because the marker is missing.
    fn check_output(&self, chunk: &Chunk, output: String) -> Result<String, LlmError> {
        let output = output.replace("\r\n", "\n");
        if !chunk.lead_in().trim().is_empty() && !output.contains(PRIMARY_MARKER) {
            return Err(LlmError::InvalidResponse(
                "missing primary marker".to_string(),
            ));
        }
        let primary = chunk.primary_text().trim();
        let simplified_len = strip_lead_in(&output).trim().len();
        let minimum = min_output_len(primary.len());
        if simplified_len < minimum {
            return Err(LlmError::InvalidResponse(format!(
                "output too short ({} bytes, expected at least {})",
                simplified_len, minimum
            )));
        }
        Ok(output)
    }

    /// Simplify one chunk. Failures are recorded in the result, never returned.
    #[instrument(skip(self, chunk), fields(chunk = chunk.index, len = chunk.primary.len()))]
    pub async fn simplify_chunk(&self, chunk: &Chunk) -> SimplificationResult {
        let primary = chunk.primary_text().trim();
        if primary.len() < self.config.min_simplify_len {
            debug!("Chunk below simplification threshold, passing through");
            return SimplificationResult::simplified(chunk, primary.to_string(), 0);
        }

        let request = self.build_request(chunk);
        let max_attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.until_ready().await;

            let outcome = self
                .service
                .complete(&request)
                .await
                .and_then(|output| self.check_output(chunk, output));

            match outcome {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "Chunk simplified");
                    return SimplificationResult::simplified(chunk, text, attempt);
                }
                Err(e) if !e.is_transient() => {
                    error!(attempt, error = %e, service = self.service.name(), "Chunk rejected by completion service");
                    return SimplificationResult::failed(
                        chunk,
                        FailureReason::Rejected(e.to_string()),
                        attempt,
                    );
                }
                Err(e) if attempt >= max_attempts => {
                    error!(attempt, error = %e, service = self.service.name(), "Chunk failed after retries");
                    return SimplificationResult::failed(
                        chunk,
                        FailureReason::ServiceUnavailable(e.to_string()),
                        attempt,
                    );
                }
                Err(e) => {
                    let delay = self.backoff_delay(attempt, &e);
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
