//! Short reader-facing notes derived from detected clauses and deadlines

use shared_types::{ClauseCategory, ClauseMatch, Deadline, RiskLevel};

pub fn generate_insights(clauses: &[ClauseMatch], deadlines: &[Deadline]) -> Vec<String> {
    let has = |category: ClauseCategory| clauses.iter().any(|c| c.category == category);
    let mut insights = Vec::new();

    if has(ClauseCategory::Termination) {
        insights.push(
            "This document contains termination clauses; review the conditions for ending the agreement"
                .to_string(),
        );
    }

    if clauses
        .iter()
        .any(|c| c.category == ClauseCategory::Payment && c.risk == RiskLevel::High)
    {
        insights.push("High-risk payment terms detected; check for penalties or fees".to_string());
    }

    if has(ClauseCategory::Liability) {
        insights.push(
            "Liability clauses present; understand your responsibilities and potential damages"
                .to_string(),
        );
    }

    if !deadlines.is_empty() {
        insights.push(format!(
            "{} deadline(s) found; mark important dates on your calendar",
            deadlines.len()
        ));
    }

    if has(ClauseCategory::Privacy) {
        insights.push(
            "Data privacy terms included; review how your personal information will be handled"
                .to_string(),
        );
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Span;

    fn clause(category: ClauseCategory, risk: RiskLevel) -> ClauseMatch {
        ClauseMatch {
            category,
            rule_id: category.as_str().to_string(),
            keyword: "kw".to_string(),
            keywords_found: vec!["kw".to_string()],
            keyword_span: Span::new(0, 2),
            span: Span::new(0, 10),
            text: "kw example".to_string(),
            risk,
        }
    }

    #[test]
    fn test_no_findings_no_insights() {
        assert!(generate_insights(&[], &[]).is_empty());
    }

    #[test]
    fn test_low_risk_payment_is_not_flagged() {
        let insights = generate_insights(&[clause(ClauseCategory::Payment, RiskLevel::Low)], &[]);
        assert!(insights.is_empty());
    }

    #[test]
    fn test_insights_follow_categories_and_deadlines() {
        let deadline = Deadline {
            text: "within 30 days".to_string(),
            span: Span::new(0, 14),
            context: "within 30 days".to_string(),
        };
        let insights = generate_insights(
            &[
                clause(ClauseCategory::Termination, RiskLevel::Low),
                clause(ClauseCategory::Payment, RiskLevel::High),
                clause(ClauseCategory::Privacy, RiskLevel::Low),
            ],
            &[deadline],
        );

        assert_eq!(insights.len(), 4);
        assert!(insights[0].contains("termination"));
        assert!(insights[1].contains("payment"));
        assert!(insights[2].starts_with("1 deadline(s)"));
        assert!(insights[3].contains("privacy"));
    }
}
