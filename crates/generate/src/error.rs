//! Provider Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required credential or setting is missing. No request was sent.
    #[display("provider not configured: {_0}")]
    Configuration(#[error(not(source))] String),
    /// The request never produced a response (DNS, TLS, timeouts).
    #[display("network error")]
    Network,
    /// The provider answered with a non-success status.
    #[display("provider returned HTTP {status}")]
    Api { status: u16 },
    /// The provider's reply does not match the declared schema.
    #[display("response does not match schema: {_0}")]
    SchemaMismatch(#[error(not(source))] String),
    /// The provider answered successfully but produced nothing usable.
    #[display("provider returned an empty response")]
    EmptyResponse,
    /// The reply is not in the expected encoding (bad base64, bad JSON envelope).
    #[display("invalid response data")]
    InvalidData,
    /// A prompt template failed to compile or render.
    #[display("prompt template error")]
    Template,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::EmptyResponse => true,
            Self::Api { status } => *status == 429 || *status >= 500,
            Self::Configuration(_) | Self::SchemaMismatch(_) | Self::InvalidData | Self::Template => false,
        }
    }
}
