//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for the local filesystem.
//! Every entry is one file in a configured directory, named after its key, and
//! accessed using `tokio::fs` for async I/O.

use crate::backend::{EntryStream, check_quota};
use crate::error::ErrorKind;
use crate::{Entry, StorageBackend, error::Result, key::validate as validate_key};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use time::UtcDateTime;
use tokio::fs::{self, DirEntry};

/// Distinguishes the temporary files of concurrent writes.
static WRITE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
///
/// Stores entries as flat files in a directory on the local filesystem.
/// Writes go to a hidden temporary file first and are renamed into place, so
/// a crash mid-write never leaves a truncated value behind.
///
/// # Examples
///
/// ```no_run
/// use storybook_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/path/to/cache")?.with_quota(5 * 1024 * 1024);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Directory holding one file per entry
    root: PathBuf,
    /// Maximum total bytes of stored values, if any
    quota: Option<u64>,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the storage directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists and is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!("storage root must be absolute: {}", root.display())));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::BackendError(format!("storage root is not a directory: {}", root.display())));
            }
        } else {
            // Use non-async here; it'll only happen once on initialization
            // and it's not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }
        Ok(Self { name: name.into(), root, quota: None })
    }

    /// Limit the total size of stored values, emulating host storage quotas.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Get the absolute path for a storage key.
    fn absolute_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_key(key)?))
    }

    fn map_io_error(e: std::io::Error, key: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(key.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(key.to_string()),
            std::io::ErrorKind::InvalidData => ErrorKind::Corrupt(key.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    fn entry(key: String, metadata: &Metadata) -> Result<Entry> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(Entry::new(key, metadata.len(), UtcDateTime::from(modified)))
    }

    /// Turns a directory entry into an [`Entry`], skipping anything that isn't
    /// a regular file with a valid key for a name (temporary files, strays).
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&str>) -> Result<Option<Entry>> {
        let Some(key) = entry.file_name().to_str().map(str::to_string) else {
            return Ok(None);
        };
        if validate_key(&key).is_err() || prefix.is_some_and(|p| !key.starts_with(p)) {
            return Ok(None);
        }
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &key))?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(Self::entry(key, &metadata)?))
    }

    /// Total bytes currently stored, and the size of the value under `key`.
    async fn usage(&self, key: &str) -> Result<(u64, u64)> {
        let mut used = 0;
        let mut existing = 0;
        let mut entries = fs::read_dir(&self.root).await.map_err(ErrorKind::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            if let Some(found) = self.process_entry(entry, None).await? {
                used += found.size;
                if found.key == key {
                    existing = found.size;
                }
            }
        }
        Ok((used, existing))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a str>) -> EntryStream<'a> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                // Someone removed the storage directory from under us: the
                // same as having no entries at all.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(ErrorKind::Io(err)));
                    return;
                }
            };
            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => { yield Err(exn::Exn::from(ErrorKind::Io(e))); continue 'entries; },
                };
                match self.process_entry(entry, prefix).await {
                    Ok(Some(entry)) => yield Ok(entry),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let abs_path = self.absolute_path(key)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, key: &str) -> Result<String> {
        let abs_path = self.absolute_path(key)?;
        Ok(fs::read_to_string(&abs_path).await.map_err(|e| Self::map_io_error(e, key))?)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let abs_path = self.absolute_path(key)?;
        if self.quota.is_some() {
            let (used, existing) = self.usage(key).await?;
            check_quota(self.quota, used, existing, key, value.len() as u64)?;
        }
        // Keys never start with a dot, so the temporary file can't collide
        // with (or be listed as) a real entry. Each write gets its own.
        let sequence = WRITE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.root.join(format!(".{key}.{}-{sequence}.tmp", std::process::id()));
        fs::write(&tmp_path, value).await.map_err(|e| Self::map_io_error(e, key))?;
        Ok(fs::rename(&tmp_path, &abs_path).await.map_err(|e| Self::map_io_error(e, key))?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let abs_path = self.absolute_path(key)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, key))?)
    }
}
