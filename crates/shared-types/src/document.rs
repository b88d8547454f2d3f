use serde::{Deserialize, Serialize};

/// Declared format of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Anything else, carrying the declared extension (lowercased, may be empty)
    Unsupported(String),
}

impl DocumentFormat {
    /// Resolve a format from a file extension (with or without the dot)
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            _ => DocumentFormat::Unsupported(ext),
        }
    }

    /// Resolve a format from a filename's extension
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => DocumentFormat::Unsupported(String::new()),
        }
    }

    /// Guess a format from leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(DocumentFormat::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            // Zip container; DOCX is the only zip format we accept
            Some(DocumentFormat::Docx)
        } else {
            None
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentFormat::Unsupported(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Unsupported(ext) => ext,
        }
    }
}

/// An uploaded document. Immutable once received and never persisted.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    format: DocumentFormat,
    bytes: Vec<u8>,
}

impl Document {
    /// Build a document from its declared filename.
    ///
    /// The extension decides the format. A filename without an extension
    /// falls back to sniffing the magic bytes.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let declared = DocumentFormat::from_filename(&filename);
        let format = match &declared {
            DocumentFormat::Unsupported(ext) if ext.is_empty() => {
                DocumentFormat::sniff(&bytes).unwrap_or(declared)
            }
            _ => declared,
        };
        Self {
            filename,
            format,
            bytes,
        }
    }

    /// Build a document with an explicit format, ignoring the filename
    pub fn with_format(filename: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            format,
            bytes,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> &DocumentFormat {
        &self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(DocumentFormat::from_filename("lease.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("nda.final.docx"), DocumentFormat::Docx);
        assert_eq!(
            DocumentFormat::from_filename("notes.txt"),
            DocumentFormat::Unsupported("txt".to_string())
        );
        assert_eq!(
            DocumentFormat::from_filename("README"),
            DocumentFormat::Unsupported(String::new())
        );
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(DocumentFormat::sniff(b"%PDF-1.5\n"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::sniff(b"PK\x03\x04rest"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::sniff(b"hello"), None);
    }

    #[test]
    fn test_document_without_extension_is_sniffed() {
        let doc = Document::new("upload", b"%PDF-1.7".to_vec());
        assert_eq!(doc.format(), &DocumentFormat::Pdf);
        assert_eq!(doc.len(), 8);
    }

    #[test]
    fn test_declared_extension_wins_over_magic() {
        let doc = Document::new("contract.txt", b"%PDF-1.7".to_vec());
        assert!(!doc.format().is_supported());
    }
}
