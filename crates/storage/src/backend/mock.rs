//! In-memory storage backend for testing.

use super::{EntryStream, check_quota};
use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use crate::models::Entry;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use time::UtcDateTime;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// In-memory storage backend for testing.
///
/// Entries are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Faults can be
/// switched on at runtime to exercise callers' recovery paths, and every
/// operation is counted so tests can assert how often storage was touched.
///
/// # Examples
///
/// ```
/// use storybook_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_entries([
///     ("book-asset-cache-MyBook-p1", r#"{"image":"AAAA","soundEffectPrompt":""}"#),
/// ]);
/// assert!(backend.exists("book-asset-cache-MyBook-p1").await?);
///
/// backend.write("book-sound-cache-MyBook-p1", "data:audio/mpeg;base64,AAAA").await?;
/// assert_eq!(backend.writes(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<String, (UtcDateTime, String)>>,
    quota: Option<u64>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with entries.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut map = HashMap::new();
        let now = UtcDateTime::now();
        for (key, value) in entries {
            let key = key.into();
            let Ok(validated) = validate_key(&key) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_entries: invalid key {key:?}");
            };
            map.insert(validated, (now, value.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            quota: None,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Limit the total size of stored values.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Make every subsequent read fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write or delete fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful and failed `read` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `write` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored value, bypassing fault injection and counters.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.storage.read().await.get(key).map(|(_, value)| value.clone())
    }

    fn check_fault(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::BackendError(format!("injected {op} fault")));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let entries: [(&str, &str); 0] = [];
        Self::with_entries(entries)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a str>) -> EntryStream<'a> {
        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<Entry> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(key, _)| prefix.is_none_or(|p| key.starts_with(p)))
                    .map(|(key, (modified, value))| Entry::new(key.clone(), value.len() as u64, *modified))
                    .collect()
            };
            for entry in entries {
                yield Ok(entry);
            }
        })
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = validate_key(key)?;
        Self::check_fault(&self.fail_reads, "read")?;
        Ok(self.storage.read().await.contains_key(&key))
    }

    async fn read(&self, key: &str) -> Result<String> {
        let key = validate_key(key)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.fail_reads, "read")?;
        let (_modified, value) =
            self.storage.read().await.get(&key).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key)))?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let key = validate_key(key)?;
        Self::check_fault(&self.fail_writes, "write")?;
        let mut guard = self.storage.write().await;
        if self.quota.is_some() {
            let used = guard.values().map(|(_, v)| v.len() as u64).sum();
            let existing = guard.get(&key).map_or(0, |(_, v)| v.len() as u64);
            check_quota(self.quota, used, existing, &key, value.len() as u64)?;
        }
        guard.insert(key, (UtcDateTime::now(), value.to_string()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = validate_key(key)?;
        Self::check_fault(&self.fail_writes, "delete")?;
        self.storage.write().await.remove(&key).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let backend = MockBackend::default();
        backend.write("test", "hello").await.unwrap();
        assert_eq!(backend.read("test").await.unwrap(), "hello");
        assert_eq!((backend.reads(), backend.writes()), (1, 1));
    }

    #[tokio::test]
    async fn test_with_entries() {
        let backend = MockBackend::with_entries([("a-p1", "one"), ("b-p1", "two")]);
        assert!(backend.exists("a-p1").await.unwrap());
        assert!(backend.exists("b-p1").await.unwrap());
        assert!(!backend.exists("c-p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let backend = MockBackend::default();
        let err = backend.read("missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MockBackend::default();
        backend.write("key", "data").await.unwrap();
        backend.delete("key").await.unwrap();
        assert!(!backend.exists("key").await.unwrap());
        let err = backend.delete("key").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let backend = MockBackend::with_entries([
            ("book-sound-cache-A-p1", "a"),
            ("book-sound-cache-A-p2", "b"),
            ("book-asset-cache-A-p1", "c"),
        ]);
        let entries = backend.list(Some("book-sound-cache-")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.key.starts_with("book-sound-cache-")));
        assert_eq!(backend.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let backend = MockBackend::with_entries([("key", "value")]);
        backend.fail_reads(true);
        assert!(backend.read("key").await.is_err());
        backend.fail_reads(false);
        backend.fail_writes(true);
        assert!(backend.write("key", "other").await.is_err());
        assert!(backend.delete("key").await.is_err());
        backend.fail_writes(false);
        assert_eq!(backend.read("key").await.unwrap(), "value");
    }

    #[tokio::test]
    async fn test_quota() {
        let backend = MockBackend::default().with_quota(8);
        backend.write("a", "12345").await.unwrap();
        let err = backend.write("b", "1234").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::QuotaExceeded { needed: 4, available: 3 }));
        assert_eq!(backend.peek("b").await, None);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let backend = MockBackend::default();
        assert!(backend.read("../etc/passwd").await.is_err());
        assert!(backend.write("bad key", "bad").await.is_err());
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn test_with_entries_panics_on_bad_key() {
        MockBackend::with_entries([("../escape", "bad")]);
    }
}
