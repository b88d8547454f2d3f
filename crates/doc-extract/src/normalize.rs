//! Whitespace normalization and segment assembly
//!
//! Normalization happens before any offset is computed, so every downstream
//! consumer (chunker, clause detector, aggregator) works on the same text.

use shared_types::{DocumentFormat, ExtractedText, Span, TextSegment};

use crate::backend::RawBlock;
use crate::error::ExtractError;

/// Normalize the text of a single block.
///
/// - CRLF, CR and form feeds become LF
/// - NUL and other C0 control characters except tab and LF are dropped
/// - trailing whitespace is stripped from every line
/// - runs of blank lines collapse to a single blank line
/// - blank lines at the start and end are removed
pub fn normalize_block(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace(['\r', '\x0C'], "\n");

    let mut out = String::with_capacity(unified.len());
    let mut pending_blank = false;

    for line in unified.split('\n') {
        let line: String = line
            .chars()
            .filter(|c| *c == '\t' || !c.is_control())
            .collect();
        let line = line.trim_end();

        if line.is_empty() {
            // Only remember a blank line once something has been written
            pending_blank = !out.is_empty();
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(line);
    }

    out
}

/// Normalize raw blocks and lay them out as contiguous segments.
///
/// Blocks that are empty after normalization (image-only pages, empty
/// paragraphs) are skipped without leaving a gap. Each segment's range
/// includes the separator that follows it.
pub fn assemble(
    format: DocumentFormat,
    blocks: Vec<RawBlock>,
    separator: &str,
) -> Result<ExtractedText, ExtractError> {
    let source_units = blocks.len() as u32;

    let normalized: Vec<(RawBlock, String)> = blocks
        .into_iter()
        .filter_map(|block| {
            let text = normalize_block(&block.text);
            (!text.is_empty()).then_some((block, text))
        })
        .collect();

    if normalized.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let mut text = String::new();
    let mut segments = Vec::with_capacity(normalized.len());
    let last = normalized.len() - 1;

    for (index, (block, block_text)) in normalized.into_iter().enumerate() {
        let start = text.len();
        text.push_str(&block_text);
        if index != last {
            text.push_str(separator);
        }
        segments.push(TextSegment {
            index,
            source: block.source,
            range: Span::new(start, text.len()),
        });
    }

    Ok(ExtractedText {
        format,
        text,
        segments,
        source_units,
    })
}
