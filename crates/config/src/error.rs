//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The config file extension is not one of `toml`, `yaml`, `yml`, `json`.
    #[display("unsupported config file: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Layers could not be merged into a [`Config`](crate::Config)
    /// (syntax errors, wrong types, unknown enum variants).
    #[display("failed to load configuration")]
    Load,
    /// The configuration loaded but a value is out of range.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// No storage path is configured and the platform has no cache directory.
    #[display("no storage directory available")]
    NoStorageDirectory,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
