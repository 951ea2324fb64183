//! Uploaded documents and format detection.

use crate::consts::{OPAQUE_MIME_TYPE, PDF_EXTENSION_REGEX, PDF_MAGIC, PDF_MIME_TYPE};
use crate::error::{ErrorKind, Result};
use std::path::Path;

/// Document formats that pages can be extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
}
impl DocumentFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            PDF_MIME_TYPE => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            return Some(Self::Pdf);
        }
        None
    }
}

/// A binary document handed over by the host, such as a file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Original file name, including extension
    pub file_name: String,
    /// MIME type reported by the host, if any
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}
impl Document {
    pub fn new(file_name: impl Into<String>, mime_type: Option<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { file_name: file_name.into(), mime_type, bytes: bytes.into() }
    }

    /// Determines the document format before any parsing happens.
    ///
    /// A declared MIME type decides: a supported one is accepted, any other is
    /// rejected whatever the file is called. Only when no type (or the opaque
    /// `application/octet-stream`) was declared are the file extension, then
    /// the leading magic bytes consulted. Returns
    /// [`ErrorKind::UnsupportedFormat`] when nothing matches.
    ///
    /// ```
    /// use storybook_extract::{Document, DocumentFormat};
    ///
    /// let upload = Document::new("Story.PDF", None, b"%PDF-1.7".to_vec());
    /// assert_eq!(upload.format().unwrap(), DocumentFormat::Pdf);
    ///
    /// let upload = Document::new("notes.pdf", Some("text/plain".into()), b"hello".to_vec());
    /// assert!(upload.format().is_err());
    /// ```
    pub fn format(&self) -> Result<DocumentFormat> {
        let declared = self
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mime| !mime.is_empty() && !mime.eq_ignore_ascii_case(OPAQUE_MIME_TYPE));
        if let Some(mime) = declared {
            return DocumentFormat::from_mime(mime)
                .ok_or_else(|| exn::Exn::from(ErrorKind::UnsupportedFormat(mime.to_string())));
        }
        let from_extension = || {
            Path::new(&self.file_name).extension().and_then(|ext| ext.to_str()).and_then(DocumentFormat::from_extension)
        };
        from_extension()
            .or_else(|| DocumentFormat::from_magic_bytes(&self.bytes))
            .ok_or_else(|| {
                let declared = self.mime_type.clone().unwrap_or_else(|| self.file_name.clone());
                exn::Exn::from(ErrorKind::UnsupportedFormat(declared))
            })
    }

    /// Book title derived from the file name: the `.pdf` extension is
    /// stripped (case-insensitively). A name that would end up empty is kept
    /// whole.
    ///
    /// ```
    /// use storybook_extract::Document;
    ///
    /// assert_eq!(Document::new("The Tortoise.pdf", None, vec![]).title(), "The Tortoise");
    /// assert_eq!(Document::new("SHOUTY.PDF", None, vec![]).title(), "SHOUTY");
    /// assert_eq!(Document::new(".pdf", None, vec![]).title(), ".pdf");
    /// ```
    pub fn title(&self) -> String {
        let name = self.file_name.trim();
        let stripped = PDF_EXTENSION_REGEX.replace(name, "");
        let stripped = stripped.trim();
        if stripped.is_empty() { name.to_string() } else { stripped.to_string() }
    }

    /// BLAKE3 digest of the document bytes.
    pub fn fingerprint(&self) -> String {
        blake3::hash(&self.bytes).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("application/pdf"), "upload.bin", b"", DocumentFormat::Pdf)]
    #[case(Some("APPLICATION/PDF"), "upload", b"", DocumentFormat::Pdf)]
    #[case(None, "story.pdf", b"", DocumentFormat::Pdf)]
    #[case(Some("application/octet-stream"), "story.Pdf", b"", DocumentFormat::Pdf)]
    #[case(None, "no-extension", b"%PDF-1.4\n", DocumentFormat::Pdf)]
    #[case(Some(""), "story.pdf", b"", DocumentFormat::Pdf)]
    fn test_format_detected(
        #[case] mime: Option<&str>,
        #[case] name: &str,
        #[case] bytes: &[u8],
        #[case] expected: DocumentFormat,
    ) {
        let document = Document::new(name, mime.map(str::to_string), bytes.to_vec());
        assert_eq!(document.format().unwrap(), expected);
    }

    #[rstest]
    #[case(Some("text/plain"), "notes.txt", b"hello")]
    #[case(None, "book.epub", b"PK\x03\x04")]
    #[case(None, "pdf", b"")]
    #[case(Some("text/plain"), "story.pdf", b"%PDF-1.4\n")]
    #[case(Some("image/png"), "scan.PDF", b"")]
    fn test_format_unsupported(#[case] mime: Option<&str>, #[case] name: &str, #[case] bytes: &[u8]) {
        let document = Document::new(name, mime.map(str::to_string), bytes.to_vec());
        let err = document.format().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[rstest]
    #[case("My Book.pdf", "My Book")]
    #[case("archive.tar.pdf", "archive.tar")]
    #[case("  spaced .pdf ", "spaced")]
    #[case("no-extension", "no-extension")]
    #[case("pdf-in-name.pdf.txt", "pdf-in-name.pdf.txt")]
    fn test_title(#[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(Document::new(file_name, None, vec![]).title(), expected);
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        let a = Document::new("a.pdf", None, b"%PDF same".to_vec());
        let b = Document::new("b.pdf", None, b"%PDF same".to_vec());
        let c = Document::new("a.pdf", None, b"%PDF other".to_vec());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
