//! Pipeline configuration
//!
//! Loaded from TOML, then overridden from the environment. Every field has
//! a default, so an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! [chunking]
//! max_chunk_len = 3000
//! chunk_overlap = 200
//!
//! [simplifier]
//! max_retries = 2
//! concurrency = 4
//!
//! [llm]
//! model = "gemini-1.5-flash"
//!
//! [clauses]
//! "other.non_compete" = ["non-compete", "non-solicitation"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::chunker::ChunkError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub simplifier: SimplifierConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
    /// Keyword overrides by clause rule id
    pub clauses: BTreeMap<String, Vec<String>>,
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Optional file, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any `name -> value` source
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(v) = parse_env(&lookup, "MAX_CHUNK_CHARS")? {
            self.chunking.max_chunk_len = v;
        }
        if let Some(v) = parse_env(&lookup, "CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = v;
        }
        // Total attempts, including the first
        if let Some(attempts) = parse_env::<u32, _>(&lookup, "GEMINI_RETRY_ATTEMPTS")? {
            self.simplifier.max_retries = attempts.saturating_sub(1);
        }
        if let Some(v) = parse_env(&lookup, "GEMINI_RETRY_BACKOFF_MS")? {
            self.simplifier.retry_backoff_base_ms = v;
        }
        if let Some(v) = parse_env(&lookup, "GEMINI_TEMPERATURE")? {
            self.llm.temperature = v;
        }
        if let Some(v) = parse_env(&lookup, "GEMINI_MAX_OUTPUT_TOKENS")? {
            self.llm.max_output_tokens = v;
        }
        if let Some(v) = parse_env(&lookup, "SIMPLIFIER_CONCURRENCY")? {
            self.simplifier.concurrency = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.simplifier.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "simplifier.concurrency must be at least 1".to_string(),
            ));
        }
        if self.simplifier.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "simplifier.requests_per_second must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.limits.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_document_bytes must be positive".to_string(),
            ));
        }
        if self.limits.max_decompressed_bytes == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_decompressed_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

/// Chunk sizing, in bytes of UTF-8 text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Upper bound on a chunk's primary range
    pub max_chunk_len: usize,
    /// Lead-in from the previous chunk sent as context
    pub chunk_overlap: usize,
    /// How far back from the hard limit to look for a natural break
    pub boundary_lookback: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: 3000,
            chunk_overlap: 200,
            boundary_lookback: 400,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_chunk_len == 0 {
            return Err(ChunkError::InvalidConfig(
                "max_chunk_len must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.max_chunk_len {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than max_chunk_len ({})",
                self.chunk_overlap, self.max_chunk_len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifierConfig {
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    /// Chunks simplified at once per document
    pub concurrency: usize,
    /// Process-wide cap on outbound completion requests
    pub requests_per_second: u32,
    /// Primary text shorter than this is passed through unchanged
    pub min_simplify_len: usize,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff_base_ms: 1500,
            max_backoff_ms: 20_000,
            concurrency: 4,
            requests_per_second: 5,
            min_simplify_len: 60,
        }
    }
}

impl SimplifierConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Read from `GEMINI_API_KEY`; never written back out
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.2,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_document_bytes: usize,
    /// Cap on how far a zip-packaged document may expand when read
    pub max_decompressed_bytes: u64,
    pub extraction_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 16 * 1024 * 1024,
            max_decompressed_bytes: 64 * 1024 * 1024,
            extraction_timeout_secs: 30,
        }
    }
}

impl LimitsConfig {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}
