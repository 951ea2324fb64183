//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not a format this crate can extract pages from.
    #[display("unsupported document format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The document parser failed on the document.
    #[display("failed to parse document: {_0}")]
    Parse(#[error(not(source))] String),
    /// The document parsed, but contains no pages.
    #[display("document contains no pages")]
    EmptyDocument,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The document is either readable or it's not.
        false
    }
}
