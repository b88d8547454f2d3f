use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClauseError {
    #[error("clause rule '{0}' has no keywords")]
    EmptyRule(String),

    #[error("invalid keyword '{keyword}' in clause rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        keyword: String,
        #[source]
        source: regex::Error,
    },
}
