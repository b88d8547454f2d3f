//! Splits extracted text into bounded chunks for the completion service
//!
//! Each chunk owns a primary range; primaries tile the text exactly once.
//! Chunks after the first also carry up to `chunk_overlap` bytes of the
//! preceding text as context, which is never part of the reassembled output.
//!
//! A primary range ends at the best natural break inside the lookback window
//! before the hard limit, in this order of preference:
//!
//! 1. paragraph break (blank line)
//! 2. sentence end
//! 3. line break
//! 4. any whitespace
//! 5. hard cut at `max_chunk_len`

use shared_types::text::{ceil_char_boundary, floor_char_boundary, is_sentence_end};
use shared_types::{Chunk, Span};
use thiserror::Error;
use tracing::debug;

use crate::config::ChunkingConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("no text to chunk")]
    EmptyInput,

    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkError> {
    config.validate()?;
    if text.trim().is_empty() {
        return Err(ChunkError::EmptyInput);
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = if text.len() - start <= config.max_chunk_len {
            text.len()
        } else {
            find_break(text, start, config.max_chunk_len, config.boundary_lookback)
        };

        let context_start = if chunks.is_empty() {
            start
        } else {
            ceil_char_boundary(text, start.saturating_sub(config.chunk_overlap))
        };

        chunks.push(Chunk {
            index: chunks.len(),
            primary: Span::new(start, end),
            context: Span::new(context_start, end),
            text: text[context_start..end].to_string(),
        });
        start = end;
    }

    debug!(
        chunk_count = chunks.len(),
        text_len = text.len(),
        max_chunk_len = config.max_chunk_len,
        "Chunked text"
    );

    Ok(chunks)
}

/// End offset for a primary range starting at `start` that must not exceed
/// `start + max_len`
fn find_break(text: &str, start: usize, max_len: usize, lookback: usize) -> usize {
    let hard = floor_char_boundary(text, start + max_len);
    if hard <= start {
        // Limit smaller than a single character; take one character
        return ceil_char_boundary(text, start + 1);
    }

    let window_start = ceil_char_boundary(text, hard.saturating_sub(lookback).max(start + 1));
    if window_start >= hard {
        return hard;
    }
    let window = &text[window_start..hard];

    if let Some(pos) = window.rfind("\n\n") {
        return window_start + pos + 2;
    }

    for (offset, c) in window.char_indices().rev() {
        let i = window_start + offset;
        if matches!(c, '.' | '!' | '?') && is_sentence_end(text, i) {
            return extend_over_spaces(text, i + c.len_utf8(), hard);
        }
    }

    if let Some(pos) = window.rfind('\n') {
        return window_start + pos + 1;
    }

    if let Some((offset, c)) = window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
        return window_start + offset + c.len_utf8();
    }

    hard
}

/// Move `pos` past spaces and tabs so the next chunk starts on a word
fn extend_over_spaces(text: &str, pos: usize, limit: usize) -> usize {
    let extra = text[pos..limit]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(char::len_utf8)
        .sum::<usize>();
    pos + extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn config(max: usize, overlap: usize, lookback: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_chunk_len: max,
            chunk_overlap: overlap,
            boundary_lookback: lookback,
        }
    }

    fn primaries<'a>(text: &'a str, chunks: &[Chunk]) -> Vec<&'a str> {
        chunks
            .iter()
            .map(|c| &text[c.primary.start..c.primary.end])
            .collect()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("The tenant shall pay rent.", &ChunkingConfig::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].primary, Span::new(0, 26));
        assert_eq!(chunks[0].context, chunks[0].primary);
        assert_eq!(chunks[0].lead_in(), "");
    }

    #[test]
    fn test_empty_and_whitespace_text_is_rejected() {
        let config = ChunkingConfig::default();
        assert_eq!(chunk_text("", &config), Err(ChunkError::EmptyInput));
        assert_eq!(chunk_text(" \n\n\t ", &config), Err(ChunkError::EmptyInput));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(
            chunk_text("text", &config(0, 0, 0)),
            Err(ChunkError::InvalidConfig(_))
        ));
        assert!(matches!(
            chunk_text("text", &config(10, 10, 5)),
            Err(ChunkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = "First clause. Still first.\n\nSecond clause here. More text follows on.";
        let chunks = chunk_text(text, &config(40, 5, 30)).unwrap();
        assert_eq!(primaries(text, &chunks)[0], "First clause. Still first.\n\n");
    }

    #[test]
    fn test_prefers_sentence_end_over_whitespace() {
        let text = "The buyer pays. The seller delivers the goods promptly.";
        let chunks = chunk_text(text, &config(30, 4, 30)).unwrap();
        assert_eq!(primaries(text, &chunks)[0], "The buyer pays. ");
        assert!(primaries(text, &chunks)[1].starts_with("The seller"));
    }

    #[test]
    fn test_falls_back_to_whitespace_then_hard_cut() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = chunk_text(text, &config(12, 2, 12)).unwrap();
        assert_eq!(primaries(text, &chunks)[0], "alpha beta ");

        let solid = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(solid, &config(10, 2, 5)).unwrap();
        assert_eq!(primaries(solid, &chunks), vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn test_context_carries_overlap_from_previous_chunk() {
        let solid = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(solid, &config(10, 3, 5)).unwrap();
        assert_eq!(chunks[1].lead_in(), "hij");
        assert_eq!(chunks[1].primary_text(), "klmnopqrst");
        assert_eq!(chunks[1].text, "hijklmnopqrst");
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "\u{e9}".repeat(20); // 40 bytes
        let chunks = chunk_text(&text, &config(7, 3, 4)).unwrap();
        for chunk in &chunks {
            assert!(chunk.primary.len() <= 7);
            assert!(chunk.context.is_valid_in(&text));
        }
    }

    #[test]
    fn test_long_document_produces_bounded_chunks() {
        let sentence = "The Licensee shall pay all fees within thirty days of the invoice date. ";
        let text = sentence.repeat(200);
        let config = ChunkingConfig::default();
        let chunks = chunk_text(&text, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.primary.len() <= config.max_chunk_len);
            assert!(chunk.text.len() <= config.max_chunk_len + config.chunk_overlap);
        }
    }

    proptest! {
        #[test]
        fn primaries_cover_text_exactly_once(
            text in "[a-z \u{e9}.\n]{1,400}",
            max in 4usize..80,
            overlap_ratio in 0.0f64..1.0,
            lookback in 0usize..60,
        ) {
            prop_assume!(!text.trim().is_empty());
            let overlap = ((max - 1) as f64 * overlap_ratio) as usize;
            let config = config(max, overlap, lookback);
            let chunks = chunk_text(&text, &config).unwrap();

            let mut expected_start = 0;
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert_eq!(chunk.primary.start, expected_start);
                prop_assert!(!chunk.primary.is_empty());
                prop_assert!(chunk.primary.len() <= max);
                prop_assert_eq!(chunk.context.end, chunk.primary.end);
                prop_assert!(chunk.primary.start - chunk.context.start <= overlap);
                prop_assert_eq!(chunk.text.as_str(), &text[chunk.context.start..chunk.context.end]);
                expected_start = chunk.primary.end;
            }
            prop_assert_eq!(expected_start, text.len());
        }
    }
}
