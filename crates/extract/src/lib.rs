//! Book models and page extraction.
//!
//! Turns an uploaded [`Document`] into ordered [`Page`](models::Page)s via an
//! injected [`DocumentParser`], and defines the models shared by the rest of
//! the workspace ([`Book`](models::Book), [`PageAsset`](models::PageAsset),
//! [`Character`](models::Character)).

mod consts;
mod document;
pub mod error;
pub mod models;
mod parser;

use exn::ResultExt;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::Page;
pub use crate::document::{Document, DocumentFormat};
#[cfg(feature = "mupdf")]
pub use crate::parser::MupdfParser;
pub use crate::parser::DocumentParser;

/// Numbers raw page texts from 1, trimming each and counting its words.
pub fn paginate<S: AsRef<str>>(texts: &[S]) -> Vec<Page> {
    texts.iter().zip(1..).map(|(text, number)| Page::new(number, text)).collect()
}

/// Easy, top-level entrypoint for extracting [`Page`]s from a document.
///
/// - Rejects unsupported formats before the parser ever sees the bytes, and
/// - Rejects documents without a single page.
#[instrument(skip_all, fields(file_name = %document.file_name, size = document.bytes.len()))]
pub fn extract(parser: &dyn DocumentParser, document: &Document) -> Result<Vec<Page>> {
    let format = document.format()?;
    tracing::debug!(?format, "Extracting page texts");
    let texts = parser.page_texts(&document.bytes).or_raise(|| ErrorKind::Parse(document.file_name.clone()))?;
    if texts.is_empty() {
        exn::bail!(ErrorKind::EmptyDocument);
    }
    Ok(paginate(&texts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pdf(name: &str) -> Document {
        Document::new(name, Some("application/pdf".to_string()), b"%PDF-1.7".to_vec())
    }

    #[test]
    fn test_paginate() {
        let pages = paginate(&["  first page ", "second"]);
        assert_eq!(pages, vec![Page::new(1, "first page"), Page::new(2, "second")]);
        assert_eq!(pages[0].word_count, 2);
    }

    #[test]
    fn test_extract_pages() {
        let parser = |_: &[u8]| -> Result<Vec<String>> { Ok(vec![" One two ".into(), "three".into()]) };
        let pages = extract(&parser, &pdf("story.pdf")).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "One two");
        assert_eq!(pages[1].page_number, 2);
    }

    #[test]
    fn test_unsupported_format_never_parses() {
        let calls = AtomicUsize::new(0);
        let parser = |_: &[u8]| -> Result<Vec<String>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        };
        let document = Document::new("notes.txt", Some("text/plain".into()), b"hi".to_vec());
        let err = extract(&parser, &document).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parser_failure() {
        let parser = |_: &[u8]| -> Result<Vec<String>> { exn::bail!(ErrorKind::Parse("bad xref".into())) };
        let err = extract(&parser, &pdf("broken.pdf")).unwrap_err();
        assert_eq!(*err, ErrorKind::Parse("broken.pdf".into()));
    }

    #[test]
    fn test_empty_document() {
        let parser = |_: &[u8]| -> Result<Vec<String>> { Ok(vec![]) };
        let err = extract(&parser, &pdf("empty.pdf")).unwrap_err();
        assert_eq!(*err, ErrorKind::EmptyDocument);
    }
}
