use serde::{Deserialize, Serialize};

use crate::document::DocumentFormat;
use crate::text::Span;

/// Where a segment came from in the source document (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum SegmentSource {
    Page(u32),
    Paragraph(u32),
}

/// Ordered unit of extracted text.
///
/// `range` points into [`ExtractedText::text`] and includes the separator
/// that follows the segment, so consecutive segments tile the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub index: usize,
    pub source: SegmentSource,
    pub range: Span,
}

/// Normalized text of a document plus its segment layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub format: DocumentFormat,
    pub text: String,
    pub segments: Vec<TextSegment>,
    /// Pages or paragraphs seen in the source, including skipped empty ones
    pub source_units: u32,
}

impl ExtractedText {
    /// Text covered by a segment
    pub fn segment_text(&self, segment: &TextSegment) -> &str {
        &self.text[segment.range.start..segment.range.end]
    }

    /// True if the segments are ordered, contiguous and cover the whole text
    pub fn segments_tile_text(&self) -> bool {
        let mut cursor = 0;
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.index != i || segment.range.start != cursor {
                return false;
            }
            if !segment.range.is_valid_in(&self.text) {
                return false;
            }
            cursor = segment.range.end;
        }
        cursor == self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedText {
        ExtractedText {
            format: DocumentFormat::Pdf,
            text: "Page one.\n\nPage two.".to_string(),
            segments: vec![
                TextSegment {
                    index: 0,
                    source: SegmentSource::Page(1),
                    range: Span::new(0, 11),
                },
                TextSegment {
                    index: 1,
                    source: SegmentSource::Page(2),
                    range: Span::new(11, 20),
                },
            ],
            source_units: 2,
        }
    }

    #[test]
    fn test_segments_tile_text() {
        let extracted = sample();
        assert!(extracted.segments_tile_text());
        assert_eq!(extracted.segment_text(&extracted.segments[1]), "Page two.");
    }

    #[test]
    fn test_gap_is_detected() {
        let mut extracted = sample();
        extracted.segments[1].range = Span::new(12, 20);
        assert!(!extracted.segments_tile_text());
    }

    #[test]
    fn test_source_serializes_tagged() {
        let json = serde_json::to_string(&SegmentSource::Page(3)).unwrap();
        assert_eq!(json, r#"{"kind":"page","index":3}"#);
    }
}
