//! PDF backend
//!
//! Text is pulled page by page with lopdf so page boundaries survive as
//! segment boundaries. When lopdf decodes no text at all (unusual font
//! encodings), pdf-extract runs over the whole file as a fallback and its
//! output is split on form feeds.

use lopdf::Document;
use tracing::{debug, warn};

use crate::backend::{RawBlock, TextExtractor};
use crate::error::ExtractError;

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pages(doc: &Document) -> Vec<RawBlock> {
        doc.get_pages()
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => RawBlock::page(page_number, text),
                Err(e) => {
                    warn!(page = page_number, error = %e, "Skipping undecodable PDF page");
                    RawBlock::page(page_number, String::new())
                }
            })
            .collect()
    }

    /// Whole-document extraction through pdf-extract.
    ///
    /// pdf-extract panics on some malformed inputs, so the call is isolated
    /// and a panic is treated the same as "no text".
    fn fallback_pages(data: &[u8]) -> Vec<RawBlock> {
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data));

        let text = match result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!(error = %e, "pdf-extract fallback failed");
                return Vec::new();
            }
            Err(_) => {
                warn!("pdf-extract fallback panicked");
                return Vec::new();
            }
        };

        text.split('\x0C')
            .enumerate()
            .map(|(i, page_text)| RawBlock::page(i as u32 + 1, page_text))
            .collect()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_handle(&self, data: &[u8]) -> bool {
        data.len() > 4 && &data[0..4] == b"%PDF"
    }

    fn block_separator(&self) -> &'static str {
        "\n\n"
    }

    fn extract_blocks(&self, data: &[u8]) -> Result<Vec<RawBlock>, ExtractError> {
        if !self.can_handle(data) {
            return Err(ExtractError::CorruptDocument(
                "missing %PDF header".to_string(),
            ));
        }

        let doc = Document::load_mem(data)
            .map_err(|e| ExtractError::CorruptDocument(format!("failed to parse PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(ExtractError::CorruptDocument(
                "PDF is password protected".to_string(),
            ));
        }

        let pages = Self::extract_pages(&doc);
        debug!(page_count = pages.len(), "lopdf page extraction complete");

        if pages.iter().any(|p| !p.text.trim().is_empty()) {
            return Ok(pages);
        }

        let fallback = Self::fallback_pages(data);
        if fallback.iter().any(|p| !p.text.trim().is_empty()) {
            debug!(page_count = fallback.len(), "Using pdf-extract fallback output");
            return Ok(fallback);
        }

        // Scanned or image-only PDF; report the pages we saw so the caller
        // can still count them
        Ok(pages)
    }
}
