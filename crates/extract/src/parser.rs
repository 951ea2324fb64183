//! Page text extraction.
//!
//! Parsing a document is delegated to a [`DocumentParser`]: "given a binary
//! document, produce an ordered sequence of page texts". The parser is
//! synchronous and CPU-bound; async callers should run it inside
//! [`spawn_blocking`](https://docs.rs/tokio/latest/tokio/task/fn.spawn_blocking.html).

use crate::error::Result;

/// Extracts raw page texts, in reading order, from document bytes.
///
/// Closures with the matching signature implement this trait, which keeps
/// test doubles short:
///
/// ```
/// use storybook_extract::DocumentParser;
/// use storybook_extract::error::Result;
///
/// let parser = |_bytes: &[u8]| -> Result<Vec<String>> { Ok(vec!["Once upon a time".into()]) };
/// assert_eq!(parser.page_texts(b"%PDF").unwrap().len(), 1);
/// ```
pub trait DocumentParser: Send + Sync {
    /// Returns one string per page. Texts may carry surrounding whitespace;
    /// trimming and numbering happen in [`paginate`](crate::paginate).
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

impl<F> DocumentParser for F
where
    F: Fn(&[u8]) -> Result<Vec<String>> + Send + Sync,
{
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>> {
        self(bytes)
    }
}

#[cfg(feature = "mupdf")]
pub use self::mupdf_parser::MupdfParser;

#[cfg(feature = "mupdf")]
mod mupdf_parser {
    use super::DocumentParser;
    use crate::consts::PDF_MIME_TYPE;
    use crate::error::{ErrorKind, Result};
    use mupdf::{Document, TextPageOptions};

    /// PDF text extraction backed by MuPDF.
    ///
    /// Text lines on a page are joined with single spaces, matching how text
    /// runs flow in a storybook page.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MupdfParser;

    impl MupdfParser {
        fn parse_error(err: mupdf::Error) -> ErrorKind {
            ErrorKind::Parse(err.to_string())
        }
    }

    impl DocumentParser for MupdfParser {
        #[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
        fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>> {
            let document = Document::from_bytes(bytes, PDF_MIME_TYPE).map_err(Self::parse_error)?;
            let count = document.page_count().map_err(Self::parse_error)?;
            let mut pages = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
            for index in 0..count {
                let page = document.load_page(index).map_err(Self::parse_error)?;
                let text = page
                    .to_text_page(TextPageOptions::empty())
                    .and_then(|text_page| text_page.to_text())
                    .map_err(Self::parse_error)?;
                pages.push(text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" "));
            }
            tracing::debug!(pages = pages.len(), "Extracted PDF page texts");
            Ok(pages)
        }
    }
}
