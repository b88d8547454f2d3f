//! Document text extraction
//!
//! Converts an uploaded PDF or DOCX into normalized plain text laid out as
//! contiguous [`TextSegment`](shared_types::TextSegment)s:
//!
//! - PDF: one segment per page (lopdf, with a pdf-extract fallback)
//! - DOCX: one segment per body paragraph (zip + quick-xml)
//!
//! Offsets in the returned [`ExtractedText`] refer to the normalized text,
//! which is the text every later stage works on.

pub mod backend;
pub mod docx;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;
pub mod normalize;
pub mod pdf;

pub use backend::{RawBlock, TextExtractor};
pub use docx::DocxExtractor;
pub use error::ExtractError;
pub use pdf::PdfExtractor;

use shared_types::{Document, DocumentFormat, ExtractedText};
use tracing::info;

/// Format dispatcher holding one backend per supported format
pub struct Extractor {
    pdf: PdfExtractor,
    docx: DocxExtractor,
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_max_decompressed_bytes(docx::DEFAULT_MAX_PART_BYTES)
    }

    /// Dispatcher whose zip-based backends stop decompressing past `limit` bytes
    pub fn with_max_decompressed_bytes(limit: u64) -> Self {
        Self {
            pdf: PdfExtractor::new(),
            docx: DocxExtractor::with_max_part_bytes(limit),
        }
    }

    /// Backend responsible for a format, if any
    pub fn backend_for(&self, format: &DocumentFormat) -> Option<&dyn TextExtractor> {
        match format {
            DocumentFormat::Pdf => Some(&self.pdf),
            DocumentFormat::Docx => Some(&self.docx),
            DocumentFormat::Unsupported(_) => None,
        }
    }

    /// Extract normalized text and segments from a document
    pub fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractError> {
        let format = document.format();
        let backend = self.backend_for(format).ok_or_else(|| {
            let ext = format.as_str();
            ExtractError::UnsupportedFormat(if ext.is_empty() {
                "unknown".to_string()
            } else {
                ext.to_string()
            })
        })?;

        if document.is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let blocks = backend.extract_blocks(document.bytes())?;
        let extracted = normalize::assemble(format.clone(), blocks, backend.block_separator())?;

        info!(
            backend = backend.name(),
            filename = document.filename(),
            segments = extracted.segments.len(),
            source_units = extracted.source_units,
            chars = extracted.text.len(),
            "Extracted document text"
        );

        Ok(extracted)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract with the default backends
pub fn extract(document: &Document) -> Result<ExtractedText, ExtractError> {
    Extractor::new().extract(document)
}
