//! Byte spans and boundary helpers over normalized UTF-8 text
//!
//! Every offset in the pipeline is a byte offset into the normalized text
//! produced by extraction. Offsets always sit on char boundaries so a span can
//! be sliced directly out of the source string.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} > end {}", start, end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely inside this span
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice the span out of `text`, or `None` if it is out of range or
    /// does not fall on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }

    /// True if the span is a valid sub-range of `text`
    pub fn is_valid_in(&self, text: &str) -> bool {
        self.start <= self.end && self.slice(text).is_some()
    }
}

/// Largest char boundary `<= index` (clamped to the text length)
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= index` (clamped to the text length)
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

/// Returns true if a sentence ends at the terminator at byte `index`.
///
/// A terminator closes a sentence when it is followed by the end of the text,
/// or by whitespace and then an uppercase letter, a digit, an opening quote or
/// bracket, or a paragraph break. This keeps "Inc. and" or "e.g. the" inside
/// a single sentence.
pub fn is_sentence_end(text: &str, index: usize) -> bool {
    let Some(c) = text[index..].chars().next() else {
        return false;
    };
    if !SENTENCE_TERMINATORS.contains(&c) {
        return false;
    }

    let rest = &text[index + c.len_utf8()..];
    // Closing quotes and brackets belong to the sentence they close
    let rest = rest.trim_start_matches(['"', '\'', ')', ']', '\u{201d}', '\u{2019}']);

    let mut chars = rest.chars();
    match chars.next() {
        None => true,
        Some(ws) if ws.is_whitespace() => {
            if ws == '\n' && rest[ws.len_utf8()..].starts_with('\n') {
                return true;
            }
            match rest.trim_start().chars().next() {
                None => true,
                Some(next) => {
                    next.is_uppercase()
                        || next.is_ascii_digit()
                        || matches!(next, '"' | '\'' | '(' | '[' | '\u{201c}' | '\u{2018}')
                }
            }
        }
        Some(_) => false,
    }
}

/// Span of the sentence containing byte `at`.
///
/// Sentences are delimited by terminators accepted by [`is_sentence_end`] and
/// by paragraph breaks (a blank line). Leading and trailing whitespace is not
/// part of the returned span.
pub fn sentence_span(text: &str, at: usize) -> Span {
    let at = floor_char_boundary(text, at.min(text.len()));

    // Walk back to the previous sentence end or paragraph break
    let mut start = 0;
    for (i, c) in text[..at].char_indices().rev() {
        if c == '\n' && text[..i].ends_with('\n') {
            start = i + 1;
            break;
        }
        if SENTENCE_TERMINATORS.contains(&c) && is_sentence_end(text, i) {
            start = i + c.len_utf8();
            break;
        }
    }

    // Walk forward to the next sentence end or paragraph break
    let mut end = text.len();
    for (offset, c) in text[at..].char_indices() {
        let i = at + offset;
        if c == '\n' && text[i + 1..].starts_with('\n') {
            end = i;
            break;
        }
        if SENTENCE_TERMINATORS.contains(&c) && is_sentence_end(text, i) {
            end = i + c.len_utf8();
            let closing = text[end..]
                .chars()
                .take_while(|ch| matches!(ch, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}'))
                .map(char::len_utf8)
                .sum::<usize>();
            end += closing;
            break;
        }
    }

    // Trim surrounding whitespace
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    let trimmed_start = start + leading;
    let trimmed_end = (end - trailing).max(trimmed_start);
    Span::new(trimmed_start, trimmed_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_span_slice_and_validity() {
        let text = "Payment is due.";
        let span = Span::new(0, 7);
        assert_eq!(span.slice(text), Some("Payment"));
        assert!(span.is_valid_in(text));
        assert!(!Span::new(10, 40).is_valid_in(text));
    }

    #[test]
    fn test_span_contains_and_overlaps() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(&Span::new(2, 5)));
        assert!(!outer.contains(&Span::new(8, 12)));
        assert!(outer.overlaps(&Span::new(8, 12)));
        assert!(!outer.overlaps(&Span::new(10, 12)));
    }

    #[test]
    fn test_char_boundaries_on_multibyte_text() {
        let text = "a\u{e9}b"; // 'é' is two bytes
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 3);
        assert_eq!(floor_char_boundary(text, 99), text.len());
    }

    #[test]
    fn test_sentence_end_requires_capital_after_period() {
        let text = "Acme Inc. and Beta LLC agree. The term starts now.";
        let inc = text.find("Inc.").unwrap() + 3;
        assert!(!is_sentence_end(text, inc));
        let agree = text.find("agree.").unwrap() + 5;
        assert!(is_sentence_end(text, agree));
    }

    #[test]
    fn test_sentence_span_finds_enclosing_sentence() {
        let text = "Recitals follow. This agreement may be terminated by either party with 30 days notice. Fees apply.";
        let at = text.find("terminated").unwrap();
        let span = sentence_span(text, at);
        assert_eq!(
            span.slice(text),
            Some("This agreement may be terminated by either party with 30 days notice.")
        );
    }

    #[test]
    fn test_sentence_span_stops_at_paragraph_break() {
        let text = "HEADING\n\nThe tenant shall pay rent\n\nNext paragraph.";
        let at = text.find("pay").unwrap();
        let span = sentence_span(text, at);
        assert_eq!(span.slice(text), Some("The tenant shall pay rent"));
    }

    #[test]
    fn test_sentence_span_includes_closing_quote() {
        let text = "He said \"Pay now.\" Then left.";
        let span = sentence_span(text, 3);
        assert_eq!(span.slice(text), Some("He said \"Pay now.\""));
    }

    proptest! {
        #[test]
        fn sentence_span_always_contains_a_valid_range(text in "[A-Za-z .!?\n]{1,120}", at in 0usize..120) {
            let at = at.min(text.len());
            let span = sentence_span(&text, at);
            prop_assert!(span.is_valid_in(&text));
        }
    }
}
