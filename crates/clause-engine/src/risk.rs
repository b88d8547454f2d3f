//! Risk scoring for matched clauses

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::RiskLevel;

use crate::patterns::{keyword_pattern, HIGH_RISK_TERMS};

lazy_static! {
    static ref HIGH_RISK_PATTERNS: Vec<Regex> = HIGH_RISK_TERMS
        .iter()
        .map(|term| Regex::new(&keyword_pattern(term)).unwrap())
        .collect();
}

/// Number of distinct high-risk terms present in `text`
pub fn count_high_risk_terms(text: &str) -> usize {
    HIGH_RISK_PATTERNS.iter().filter(|re| re.is_match(text)).count()
}

/// Two or more high-risk terms is `High`, one is `Medium`, none is `Low`
pub fn assess_risk(text: &str) -> RiskLevel {
    match count_high_risk_terms(text) {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sentence_is_low_risk() {
        assert_eq!(
            assess_risk("Either party may end this agreement with notice."),
            RiskLevel::Low
        );
    }

    #[test]
    fn test_single_term_is_medium_risk() {
        assert_eq!(
            assess_risk("A late fee applies to any breach of the payment schedule."),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_multiple_terms_are_high_risk() {
        assert_eq!(
            assess_risk("Any breach entitles the Landlord to liquidated damages and a penalty."),
            RiskLevel::High
        );
    }

    #[test]
    fn test_overlapping_terms_count_separately() {
        // "liquidated damages" and "damages" are distinct terms
        assert_eq!(count_high_risk_terms("liquidated damages apply"), 2);
    }

    #[test]
    fn test_terms_inside_other_words_are_ignored() {
        assert_eq!(count_high_risk_terms("as defined in the default-free schedule"), 1);
        assert_eq!(count_high_risk_terms("the avoidance of doubt"), 0);
    }
}
