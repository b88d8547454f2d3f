use serde::{Deserialize, Serialize};

use crate::text::Span;

/// Clause classification. The order of the variants is the tie-break order
/// used when two matches start at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCategory {
    Termination,
    Payment,
    Liability,
    Privacy,
    Other,
}

impl ClauseCategory {
    pub const ALL: [ClauseCategory; 5] = [
        ClauseCategory::Termination,
        ClauseCategory::Payment,
        ClauseCategory::Liability,
        ClauseCategory::Privacy,
        ClauseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseCategory::Termination => "termination",
            ClauseCategory::Payment => "payment",
            ClauseCategory::Liability => "liability",
            ClauseCategory::Privacy => "privacy",
            ClauseCategory::Other => "other",
        }
    }

    /// Parse a category name. Unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "termination" => ClauseCategory::Termination,
            "payment" => ClauseCategory::Payment,
            "liability" => ClauseCategory::Liability,
            "privacy" | "data_privacy" => ClauseCategory::Privacy,
            _ => ClauseCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A legally significant sentence found in the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseMatch {
    pub category: ClauseCategory,
    /// Identifier of the rule that produced the match, e.g. `payment` or
    /// `other.confidentiality`
    pub rule_id: String,
    /// Longest keyword matched in the sentence
    pub keyword: String,
    /// Every keyword of the category found in the sentence, in text order
    pub keywords_found: Vec<String>,
    /// Offset of `keyword` in the original text
    pub keyword_span: Span,
    /// Offset of the whole sentence in the original text
    pub span: Span,
    pub text: String,
    pub risk: RiskLevel,
}

/// A date or duration mentioned in the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub text: String,
    pub span: Span,
    pub context: String,
}
