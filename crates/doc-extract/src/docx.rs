//! DOCX backend
//!
//! A DOCX file is a zip package; the body lives in `word/document.xml`.
//! Every top-level `w:p` paragraph becomes one block. Tables and drawing
//! content (text boxes, shapes) are skipped.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::backend::{RawBlock, TextExtractor};
use crate::error::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Default cap on the decompressed size of `word/document.xml`
pub const DEFAULT_MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

pub struct DocxExtractor {
    max_part_bytes: u64,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self::with_max_part_bytes(DEFAULT_MAX_PART_BYTES)
    }

    /// Extractor that refuses document parts larger than `max_part_bytes`
    /// once decompressed
    pub fn with_max_part_bytes(max_part_bytes: u64) -> Self {
        Self { max_part_bytes }
    }

    fn read_document_part(&self, data: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| {
            ExtractError::CorruptDocument(format!("not a valid DOCX package: {}", e))
        })?;

        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ExtractError::CorruptDocument(format!("DOCX package has no {}", DOCUMENT_PART))
        })?;

        let limit = self.max_part_bytes;
        if part.size() > limit {
            return Err(Self::too_large(part.size(), limit));
        }

        // The declared size can lie, so the read is bounded as well
        let mut xml = Vec::new();
        (&mut part)
            .take(limit + 1)
            .read_to_end(&mut xml)
            .map_err(|e| {
                ExtractError::CorruptDocument(format!("failed to read {}: {}", DOCUMENT_PART, e))
            })?;
        if xml.len() as u64 > limit {
            return Err(Self::too_large(xml.len() as u64, limit));
        }

        String::from_utf8(xml).map_err(|e| {
            ExtractError::CorruptDocument(format!("{} is not UTF-8: {}", DOCUMENT_PART, e))
        })
    }

    fn too_large(size: u64, limit: u64) -> ExtractError {
        ExtractError::CorruptDocument(format!(
            "{} expands to at least {} bytes, the limit is {}",
            DOCUMENT_PART, size, limit
        ))
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect paragraph text from WordprocessingML
pub(crate) fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut drawing_depth = 0usize;

    loop {
        let skipping = table_depth > 0 || drawing_depth > 0;

        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" if !skipping => current = Some(String::new()),
                b"w:t" if !skipping => in_text = true,
                b"w:tbl" => table_depth += 1,
                b"w:drawing" | b"w:pict" | b"w:object" => drawing_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if skipping {
                    continue;
                }
                match e.name().as_ref() {
                    b"w:p" => paragraphs.push(String::new()),
                    b"w:tab" => push_to(&mut current, "\t"),
                    b"w:br" | b"w:cr" => push_to(&mut current, "\n"),
                    b"w:noBreakHyphen" => push_to(&mut current, "-"),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if in_text && !skipping {
                    let text = t.unescape().map_err(|e| {
                        ExtractError::CorruptDocument(format!("invalid text in document.xml: {}", e))
                    })?;
                    push_to(&mut current, &text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" if !skipping => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:drawing" | b"w:pict" | b"w:object" => {
                    drawing_depth = drawing_depth.saturating_sub(1)
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::CorruptDocument(format!(
                    "malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_to(current: &mut Option<String>, text: &str) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push_str(text);
    }
}

impl TextExtractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.starts_with(b"PK\x03\x04")
    }

    /// Paragraphs are joined by a blank line so sentence and chunk
    /// boundaries never run across them
    fn block_separator(&self) -> &'static str {
        "\n\n"
    }

    fn extract_blocks(&self, data: &[u8]) -> Result<Vec<RawBlock>, ExtractError> {
        let xml = self.read_document_part(data)?;
        let paragraphs = parse_paragraphs(&xml)?;
        debug!(paragraph_count = paragraphs.len(), "DOCX paragraph extraction complete");

        Ok(paragraphs
            .into_iter()
            .enumerate()
            .map(|(i, text)| RawBlock::paragraph(i as u32 + 1, text))
            .collect())
    }
}
