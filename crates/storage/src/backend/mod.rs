//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! key-value interface for host storage (a local directory, an in-memory map
//! in tests, or a read-only view of either).

mod local;
#[cfg(feature = "mock")]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use crate::models::Entry;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;

/// Unified interface for key-value storage backends.
///
/// All operations are asynchronous so that slow media never blocks the
/// caller's event loop. Values are strings: structured values are encoded by
/// the caller (JSON, data URLs) before they reach the backend.
///
/// # Key Handling
/// Keys must pass [`validate_key`](crate::validate_key). Implementations
/// should enforce this validation.
///
/// # Examples
///
/// ```
/// use storybook_storage::{backend::StorageBackend, error::Result};
///
/// async fn cached_length(backend: &dyn StorageBackend) -> Result<usize> {
///     let key = "book-asset-cache-MyBook-p1";
///     if backend.exists(key).await? {
///         let value = backend.read(key).await?;
///         Ok(value.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend. Used for logging only.
    fn name(&self) -> &str;

    /// List all entries matching an optional key prefix.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<Entry>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream entry metadata matching an optional key prefix.
    ///
    /// Prefixes are plain string prefixes (`"book-sound-cache-"`), not
    /// validated keys, so they may end in a separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use storybook_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Some("book-sound-cache-"));
    /// while let Some(entry) = stream.try_next().await? {
    ///     println!("{}: {} bytes", entry.key, entry.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a str>) -> EntryStream<'a>;

    /// Check if an entry exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read an entry's value.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if no entry is
    /// stored under the key.
    async fn read(&self, key: &str) -> Result<String>;

    /// Write an entry, replacing any existing value.
    ///
    /// Returns [`QuotaExceeded`](crate::error::ErrorKind::QuotaExceeded) if
    /// the backend enforces a quota and the value does not fit.
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Delete an entry.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if no entry is
    /// stored under the key.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Bytes left under `quota` once `key` is replaced by a value of `size` bytes.
///
/// Shared by the backends that emulate host storage quotas: the existing value
/// under the key is not counted, since it is about to be overwritten.
pub(crate) fn check_quota(quota: Option<u64>, used: u64, existing: u64, key: &str, size: u64) -> Result<()> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let available = quota.saturating_sub(used.saturating_sub(existing));
    if size > available {
        tracing::debug!(key, size, available, "Rejecting write over storage quota");
        exn::bail!(crate::error::ErrorKind::QuotaExceeded { needed: size, available });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_quota_unbounded() {
        assert!(check_quota(None, u64::MAX, 0, "k", u64::MAX).is_ok());
    }

    #[test]
    fn test_quota_counts_replaced_value() {
        // 10 byte quota, 8 used of which 6 belong to the key being replaced.
        assert!(check_quota(Some(10), 8, 6, "k", 8).is_ok());
        let err = check_quota(Some(10), 8, 6, "k", 9).unwrap_err();
        assert!(matches!(&*err, ErrorKind::QuotaExceeded { needed: 9, available: 8 }));
    }
}
