// Date and duration extraction
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::text::{ceil_char_boundary, floor_char_boundary};
use shared_types::{Deadline, Span};

/// Bytes of surrounding text kept on each side of a match
pub const CONTEXT_RADIUS: usize = 100;

lazy_static! {
    static ref DATE_PATTERNS: Vec<Regex> = vec![
        // 12/03/2024, 1-2-24
        Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b").unwrap(),
        // 12 March 2024
        Regex::new(
            r"(?i)\b\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{2,4}\b"
        )
        .unwrap(),
        // March 12, 2024
        Regex::new(
            r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b"
        )
        .unwrap(),
        // within 30 days
        Regex::new(r"(?i)\bwithin\s+\d+\s+(?:days?|weeks?|months?|years?)\b").unwrap(),
        // 30 days after
        Regex::new(r"(?i)\b\d+\s+(?:days?|weeks?|months?|years?)\s+(?:from|after|before)\b")
            .unwrap(),
    ];
}

/// Find dates and relative deadlines in `text`, ordered by position.
///
/// A match lying entirely inside another match is dropped; partially
/// overlapping matches ("within 30 days after") are both kept.
pub fn extract_deadlines(text: &str) -> Vec<Deadline> {
    let spans: Vec<Span> = DATE_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| Span::new(m.start(), m.end())))
        .collect();

    drop_contained(spans)
        .into_iter()
        .map(|span| Deadline {
            text: text[span.start..span.end].to_string(),
            span,
            context: context_around(text, span),
        })
        .collect()
}

/// Sort spans by position and drop any span lying inside another
fn drop_contained(mut spans: Vec<Span>) -> Vec<Span> {
    // Longest first at equal starts, so every earlier span starts no later
    // and containment reduces to comparing against the furthest end seen
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    spans.dedup();

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    let mut furthest_end = 0;
    for span in spans {
        if !kept.is_empty() && span.end <= furthest_end {
            continue;
        }
        furthest_end = furthest_end.max(span.end);
        kept.push(span);
    }
    kept
}

fn context_around(text: &str, span: Span) -> String {
    let start = floor_char_boundary(text, span.start.saturating_sub(CONTEXT_RADIUS));
    let end = ceil_char_boundary(text, span.end + CONTEXT_RADIUS);
    text[start..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn texts(deadlines: &[Deadline]) -> Vec<&str> {
        deadlines.iter().map(|d| d.text.as_str()).collect()
    }

    #[test]
    fn test_extracts_numeric_and_named_dates() {
        let text = "Signed on 01/02/2024. Rent starts 12 March 2024 and ends June 30, 2025.";
        let deadlines = extract_deadlines(text);
        assert_eq!(
            texts(&deadlines),
            vec!["01/02/2024", "12 March 2024", "June 30, 2025"]
        );
    }

    #[test]
    fn test_extracts_relative_deadlines() {
        let text = "Invoices are payable within 30 days. Notice must be given 60 days before renewal.";
        let deadlines = extract_deadlines(text);
        assert_eq!(texts(&deadlines), vec!["within 30 days", "60 days before"]);
    }

    #[test]
    fn test_partial_overlaps_are_both_kept() {
        let deadlines = extract_deadlines("Pay within 10 days after delivery.");
        assert_eq!(texts(&deadlines), vec!["within 10 days", "10 days after"]);
    }

    #[test]
    fn test_spans_slice_back_to_match_text() {
        let text = "Caf\u{e9} lease: terminate within 2 months of notice.";
        for deadline in extract_deadlines(text) {
            assert_eq!(deadline.span.slice(text), Some(deadline.text.as_str()));
            assert!(deadline.context.contains(&deadline.text));
        }
    }

    #[test]
    fn test_context_is_bounded() {
        let padding = "x".repeat(300);
        let text = format!("{} within 5 days {}", padding, padding);
        let deadlines = extract_deadlines(&text);
        assert_eq!(deadlines.len(), 1);
        assert!(deadlines[0].context.len() <= "within 5 days".len() + 2 * CONTEXT_RADIUS);
    }

    #[test]
    fn test_no_dates_yields_nothing() {
        assert!(extract_deadlines("The parties agree to cooperate.").is_empty());
    }

    #[test]
    fn test_contained_spans_are_dropped() {
        let spans = vec![
            Span::new(10, 20),
            Span::new(0, 30),
            Span::new(25, 40),
            Span::new(0, 30),
            Span::new(31, 35),
            Span::new(41, 45),
        ];
        assert_eq!(
            drop_contained(spans),
            vec![Span::new(0, 30), Span::new(25, 40), Span::new(41, 45)]
        );
    }

    proptest! {
        #[test]
        fn kept_spans_match_pairwise_containment(
            raw in proptest::collection::vec((0usize..200, 0usize..40), 0..60)
        ) {
            let spans: Vec<Span> = raw.iter().map(|&(start, len)| Span::new(start, start + len)).collect();
            let kept = drop_contained(spans.clone());

            let mut expected: Vec<Span> = spans
                .iter()
                .filter(|s| !spans.iter().any(|o| o != *s && o.contains(s)))
                .copied()
                .collect();
            expected.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
            expected.dedup();

            prop_assert_eq!(kept, expected);
        }
    }
}
