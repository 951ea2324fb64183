use super::Page;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::UtcDateTime;

/// A book cover: either a remote image or a generated one held inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    /// Image reference by URL (built-in books, placeholder covers).
    Url(String),
    /// Generated image bytes, base64-encoded.
    Generated { mime_type: String, base64: String },
}
impl Cover {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }
}
impl Display for Cover {
    /// Renders the cover as something an `<img src>` accepts.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Generated { mime_type, base64 } => write!(f, "data:{mime_type};base64,{base64}"),
        }
    }
}

/// A book in the library. Immutable after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Display title, derived from the uploaded file name
    pub title: String,
    pub cover: Cover,
    /// Pages in reading order, numbered from 1
    pub pages: Vec<Page>,
    /// BLAKE3 digest of the source document (or of the page texts for
    /// built-in books). Stable across re-ingestion of the same document.
    pub fingerprint: String,
    pub added_at: UtcDateTime,
}
impl Book {
    pub fn new(title: impl Into<String>, cover: Cover, pages: Vec<Page>, fingerprint: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            cover,
            pages,
            fingerprint: fingerprint.into(),
            added_at: UtcDateTime::now(),
        }
    }

    /// Builds a book from already-split page texts, fingerprinting the text
    /// itself. Used for books that never came from an uploaded document.
    pub fn from_texts<S: AsRef<str>>(title: impl Into<String>, cover: Cover, texts: &[S]) -> Self {
        let pages = crate::paginate(texts);
        let mut hasher = blake3::Hasher::new();
        for page in &pages {
            hasher.update(page.text.as_bytes());
            // Page boundary marker so ["ab", "c"] and ["a", "bc"] differ.
            hasher.update(&[0]);
        }
        Self::new(title, cover, pages, hasher.finalize().to_string())
    }

    /// Page at a 0-based reading index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total words across all pages.
    pub fn word_count(&self) -> u64 {
        self.pages.iter().map(|p| u64::from(p.word_count)).sum()
    }

    /// All page texts joined by blank lines, for whole-book analysis.
    pub fn full_text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }
}
