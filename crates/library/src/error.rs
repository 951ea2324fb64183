//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Every failure a reader can run into maps onto one of a handful of kinds,
//! each with a message fit for display ([`ErrorKind::user_message`]). Cache
//! faults are deliberately absent: the cache recovers from them locally.

use derive_more::{Display, Error};
use storybook_extract::error::{Error as ExtractError, ErrorKind as ExtractErrorKind};
use storybook_generate::error::{Error as GenerateError, ErrorKind as GenerateErrorKind};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The uploaded document is not a PDF.
    #[display("unsupported document: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The document could not be split into pages.
    #[display("failed to parse document: {_0}")]
    ParseFailure(#[error(not(source))] String),
    /// A provider failed, or answered with something unusable.
    #[display("generation failed: {_0}")]
    GenerationFailure(#[error(not(source))] String),
    /// A credential or setting needed for the operation is missing or invalid.
    #[display("not configured: {_0}")]
    ConfigurationError(#[error(not(source))] String),
    /// Local storage could not be opened.
    #[display("storage unavailable")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationFailure(_))
    }

    /// A short message suitable for showing to the reader.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat(_) => "Only PDF files can be added to the library.".to_string(),
            Self::ParseFailure(_) => "Failed to add new book. Could not read the pages of this PDF.".to_string(),
            Self::GenerationFailure(_) => "Could not generate an image. Please try again.".to_string(),
            Self::ConfigurationError(what) => format!("This feature is not set up yet: {what} is missing."),
            Self::Storage => "Local storage is unavailable.".to_string(),
        }
    }

    /// Wraps a provider error, keeping its error tree as a child.
    ///
    /// Missing credentials are a configuration problem, everything else is a
    /// generation failure.
    #[track_caller]
    pub fn generation(err: GenerateError) -> Error {
        let kind = match &*err {
            GenerateErrorKind::Configuration(what) => Self::ConfigurationError(what.clone()),
            other => Self::GenerationFailure(other.to_string()),
        };
        err.raise(kind)
    }

    /// Wraps an extraction error, keeping its error tree as a child.
    #[track_caller]
    pub fn extraction(err: ExtractError) -> Error {
        let kind = match &*err {
            ExtractErrorKind::UnsupportedFormat(format) => Self::UnsupportedFormat(format.clone()),
            other => Self::ParseFailure(other.to_string()),
        };
        err.raise(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_mapping() {
        let err = ErrorKind::generation(exn::Exn::from(GenerateErrorKind::Configuration("Gemini API key".into())));
        assert_eq!(*err, ErrorKind::ConfigurationError("Gemini API key".into()));
        let err = ErrorKind::generation(exn::Exn::from(GenerateErrorKind::Api { status: 503 }));
        assert_eq!(*err, ErrorKind::GenerationFailure("provider returned HTTP 503".into()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_extraction_mapping() {
        let err = ErrorKind::extraction(exn::Exn::from(ExtractErrorKind::UnsupportedFormat("text/plain".into())));
        assert_eq!(*err, ErrorKind::UnsupportedFormat("text/plain".into()));
        let err = ErrorKind::extraction(exn::Exn::from(ExtractErrorKind::EmptyDocument));
        assert_eq!(*err, ErrorKind::ParseFailure("document contains no pages".into()));
    }

    #[test]
    fn test_user_messages_are_never_empty() {
        let kinds = [
            ErrorKind::UnsupportedFormat("x".into()),
            ErrorKind::ParseFailure("x".into()),
            ErrorKind::GenerationFailure("x".into()),
            ErrorKind::ConfigurationError("ElevenLabs API key".into()),
            ErrorKind::Storage,
        ];
        for kind in kinds {
            assert!(!kind.user_message().is_empty());
        }
        assert_eq!(
            ErrorKind::ConfigurationError("ElevenLabs API key".into()).user_message(),
            "This feature is not set up yet: ElevenLabs API key is missing."
        );
    }
}
