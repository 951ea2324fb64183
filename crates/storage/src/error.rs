//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No entry is stored under the key.
    #[display("key not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (permissions, read-only media).
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Writing the value would exceed the configured storage quota.
    #[display("storage quota exceeded: {needed} bytes needed, {available} bytes available")]
    QuotaExceeded {
        /// Bytes required by the write.
        needed: u64,
        /// Bytes left under the quota.
        available: u64,
    },
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Key contains characters that cannot be stored.
    #[display("invalid key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Stored bytes are not a valid UTF-8 value.
    #[display("corrupt value stored under key: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}
