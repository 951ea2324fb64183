//! Key validation.
//!
//! Keys double as file names for the local backend, so they are restricted to
//! a conservative character set that is valid on every filesystem.

use crate::error::{ErrorKind, Result};

/// Longest key accepted, in bytes. Comfortably below common filename limits.
pub const MAX_KEY_LENGTH: usize = 200;

/// Validates a storage key for security and correctness.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.`. Keys must be non-empty,
/// at most [`MAX_KEY_LENGTH`] bytes and must not start with a dot (no hidden
/// files, no `.`/`..` traversal).
///
/// # Returns
/// Returns the key as an owned string if valid, or
/// [`InvalidKey`](crate::error::ErrorKind::InvalidKey) if invalid.
///
/// # Examples
///
/// ```
/// use storybook_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("book-asset-cache-MyBook-p1").is_ok());
/// assert!(validate_key("book-character-cache-The-Great-Gatsby").is_ok());
/// // Invalid keys
/// assert!(validate_key("").is_err());
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("nested/key").is_err());
/// assert!(validate_key(".hidden").is_err());
/// ```
pub fn validate(key: impl AsRef<str>) -> Result<String> {
    let key = key.as_ref();
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || key.starts_with('.') {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}
