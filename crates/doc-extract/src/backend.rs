//! Common capability interface for format-specific extraction backends

use shared_types::SegmentSource;

use crate::error::ExtractError;

/// Raw text of one source unit (a page or a paragraph) before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub source: SegmentSource,
    pub text: String,
}

impl RawBlock {
    pub fn page(number: u32, text: impl Into<String>) -> Self {
        Self {
            source: SegmentSource::Page(number),
            text: text.into(),
        }
    }

    pub fn paragraph(number: u32, text: impl Into<String>) -> Self {
        Self {
            source: SegmentSource::Paragraph(number),
            text: text.into(),
        }
    }
}

/// Trait for document extraction backends
pub trait TextExtractor: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Check if the bytes look like something this backend can parse
    fn can_handle(&self, data: &[u8]) -> bool;

    /// Separator placed between consecutive blocks in the joined text
    fn block_separator(&self) -> &'static str;

    /// Extract raw blocks in document order.
    ///
    /// Blocks may be empty; the caller drops them after normalization.
    fn extract_blocks(&self, data: &[u8]) -> Result<Vec<RawBlock>, ExtractError>;
}
