//! Cache Error Types
//!
//! Cache faults never reach callers of [`CacheStore`](crate::CacheStore): they
//! are logged and recovered locally (a miss on read, a no-op on write). These
//! kinds exist so the fallible internals can carry location-tracked error
//! trees up to the point where they are logged.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The storage backend failed (quota, permissions, I/O).
    #[display("storage fault on key: {_0}")]
    Storage(#[error(not(source))] String),
    /// A stored value could not be encoded or decoded.
    #[display("invalid cache data under key: {_0}")]
    InvalidData(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
