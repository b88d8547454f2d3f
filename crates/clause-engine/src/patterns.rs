//! Keyword lists and pattern construction for clause detection

use regex::Regex;

/// Ending an agreement
pub const TERMINATION_KEYWORDS: &[&str] = &[
    "terminate",
    "termination",
    "end this agreement",
    "cancel",
    "cancellation",
    "dissolution",
    "expire",
    "expiry",
    "expiration",
];

/// Money owed, charged or refunded
pub const PAYMENT_KEYWORDS: &[&str] = &[
    "payment",
    "pay",
    "fee",
    "cost",
    "charge",
    "invoice",
    "billing",
    "due",
    "owe",
    "refund",
    "penalty",
    "fine",
];

/// Responsibility for loss or damage
pub const LIABILITY_KEYWORDS: &[&str] = &[
    "liable",
    "liability",
    "responsible",
    "responsibility",
    "damages",
    "compensation",
    "indemnify",
    "indemnification",
];

/// Personal data handling
pub const PRIVACY_KEYWORDS: &[&str] = &[
    "personal data",
    "privacy",
    "data protection",
    "GDPR",
    "data processing",
    "consent",
    "data subject",
];

pub const CONFIDENTIALITY_KEYWORDS: &[&str] = &[
    "confidential",
    "confidentiality",
    "non-disclosure",
    "proprietary",
    "trade secret",
    "private information",
];

pub const INTELLECTUAL_PROPERTY_KEYWORDS: &[&str] = &[
    "copyright",
    "patent",
    "trademark",
    "intellectual property",
    "proprietary rights",
    "ownership",
];

pub const DISPUTE_RESOLUTION_KEYWORDS: &[&str] = &[
    "dispute",
    "arbitration",
    "mediation",
    "litigation",
    "court",
    "jurisdiction",
    "governing law",
];

pub const FORCE_MAJEURE_KEYWORDS: &[&str] = &[
    "force majeure",
    "act of god",
    "natural disaster",
    "unforeseeable circumstances",
    "beyond control",
];

/// Terms that raise the risk level of the sentence they appear in
pub const HIGH_RISK_TERMS: &[&str] = &[
    "penalty",
    "fine",
    "breach",
    "default",
    "violation",
    "damages",
    "liquidated damages",
    "forfeit",
    "void",
    "terminate immediately",
    "irreparable harm",
];

/// Inflections accepted after a keyword ("terminate" → "terminated")
const INFLECTION_SUFFIX: &str = "(?:s|es|d|ed|ing|led|ling)?";

/// Build a case-insensitive, word-bounded pattern for a keyword.
///
/// Words in multi-word phrases may be separated by any whitespace, including
/// line breaks left over from extraction.
pub fn keyword_pattern(keyword: &str) -> String {
    let body = keyword
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!(r"(?i)\b{}{}\b", body, INFLECTION_SUFFIX)
}

/// Compile [`keyword_pattern`]
pub fn keyword_regex(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&keyword_pattern(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matches_inflections() {
        let re = keyword_regex("terminate").unwrap();
        assert!(re.is_match("This agreement may be TERMINATED at any time"));
        assert!(re.is_match("either party terminates"));
        assert!(!re.is_match("termination"));
    }

    #[test]
    fn test_keyword_is_word_bounded() {
        let re = keyword_regex("fine").unwrap();
        assert!(re.is_match("a fine of $500"));
        assert!(!re.is_match("as defined below"));

        let re = keyword_regex("due").unwrap();
        assert!(!re.is_match("undue influence"));
    }

    #[test]
    fn test_multi_word_keyword_spans_line_breaks() {
        let re = keyword_regex("force majeure").unwrap();
        assert!(re.is_match("an event of Force\nMajeure"));
    }

    #[test]
    fn test_keyword_with_punctuation_is_escaped() {
        let re = keyword_regex("non-disclosure").unwrap();
        assert!(re.is_match("this Non-Disclosure Agreement"));
        assert!(!re.is_match("nonXdisclosure"));
    }
}
