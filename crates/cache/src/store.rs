use crate::error::{ErrorKind, Result};
use crate::key::{KeyStrategy, Namespace};
use crate::value::CacheValue;
use exn::ResultExt;
use storybook_extract::models::Book;
use storybook_storage::BackendHandle;
use storybook_storage::error::ErrorKind as StorageErrorKind;
use tracing::{debug, info, warn};

/// Namespaced, typed cache over a storage backend.
///
/// Every operation is infallible from the caller's point of view: storage
/// faults (quota, permissions, I/O, undecodable values) are logged and then
/// behave as a miss on read or a no-op on write. There is no eviction.
#[derive(Clone)]
pub struct CacheStore {
    backend: BackendHandle,
    strategy: KeyStrategy,
}
impl CacheStore {
    pub fn new(backend: BackendHandle, strategy: KeyStrategy) -> Self {
        Self { backend, strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    pub fn key(&self, namespace: Namespace, book: &Book, page_number: u32) -> String {
        self.strategy.key(namespace, book, page_number)
    }

    /// Reads and decodes the value cached for a book page. The page number
    /// is ignored for per-book namespaces.
    pub async fn get<T: CacheValue>(&self, namespace: Namespace, book: &Book, page_number: u32) -> Option<T> {
        let key = self.key(namespace, book, page_number);
        match self.fetch(&key).await {
            Ok(Some(value)) => {
                debug!(%key, "Cache hit");
                Some(value)
            },
            Ok(None) => {
                debug!(%key, "Cache miss");
                None
            },
            Err(err) => {
                warn!(%key, backend = self.backend.name(), error = ?err, "Cache read failed; treating as a miss");
                None
            },
        }
    }

    /// Encodes and stores a value, replacing anything under the same key.
    pub async fn set<T: CacheValue>(&self, namespace: Namespace, book: &Book, page_number: u32, value: &T) {
        let key = self.key(namespace, book, page_number);
        match self.store(&key, value).await {
            Ok(()) => debug!(%key, "Cached value"),
            Err(err) => warn!(%key, backend = self.backend.name(), error = ?err, "Cache write failed; value dropped"),
        }
    }

    /// Checks for an entry without reading or decoding it.
    pub async fn contains(&self, namespace: Namespace, book: &Book, page_number: u32) -> bool {
        let key = self.key(namespace, book, page_number);
        match self.backend.exists(&key).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(%key, backend = self.backend.name(), error = ?err, "Cache lookup failed; treating as a miss");
                false
            },
        }
    }

    /// Removes every entry in a namespace, across all books. Returns how many
    /// entries were removed; entries that fail to delete are logged and kept.
    pub async fn clear(&self, namespace: Namespace) -> usize {
        let prefix = namespace.prefix();
        let entries = match self.backend.list(Some(prefix)).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(prefix, backend = self.backend.name(), error = ?err, "Failed to list cache entries");
                return 0;
            },
        };
        let mut removed = 0;
        for entry in entries {
            match self.backend.delete(&entry.key).await {
                Ok(()) => removed += 1,
                Err(err) => warn!(key = %entry.key, error = ?err, "Failed to delete cache entry"),
            }
        }
        info!(prefix, removed, "Cleared cache namespace");
        removed
    }

    async fn fetch<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.backend.read(key).await {
            Ok(raw) => raw,
            Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Storage(key.to_string())),
        };
        T::decode(raw).map(Some).or_raise(|| ErrorKind::InvalidData(key.to_string()))
    }

    async fn store<T: CacheValue>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = value.encode().or_raise(|| ErrorKind::InvalidData(key.to_string()))?;
        self.backend.write(key, &encoded).await.or_raise(|| ErrorKind::Storage(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storybook_extract::models::{Character, Cover, PageAsset, SoundClip};
    use storybook_storage::backend::{MockBackend, ReadOnlyBackend};

    fn book() -> Book {
        Book::from_texts("MyBook", Cover::url("cover.jpg"), &["Once upon a time.", "The end."])
    }

    fn store() -> (Arc<MockBackend>, CacheStore) {
        let backend = Arc::new(MockBackend::default());
        (backend.clone(), CacheStore::new(backend, KeyStrategy::Title))
    }

    #[tokio::test]
    async fn test_structured_round_trip() {
        let (backend, cache) = store();
        let asset = PageAsset::new("AAAA", "birdsong");
        cache.set(Namespace::Asset, &book(), 1, &asset).await;
        assert_eq!(cache.get::<PageAsset>(Namespace::Asset, &book(), 1).await, Some(asset));
        assert_eq!(
            backend.peek("book-asset-cache-MyBook-p1").await.as_deref(),
            Some(r#"{"image":"AAAA","soundEffectPrompt":"birdsong"}"#)
        );
        assert_eq!(cache.get::<PageAsset>(Namespace::Asset, &book(), 2).await, None);
    }

    #[tokio::test]
    async fn test_text_round_trip() {
        let (backend, cache) = store();
        let clip = SoundClip("data:audio/mpeg;base64,SUQz".into());
        cache.set(Namespace::Sound, &book(), 2, &clip).await;
        assert_eq!(cache.get::<SoundClip>(Namespace::Sound, &book(), 2).await, Some(clip));
        assert_eq!(backend.peek("book-sound-cache-MyBook-p2").await.as_deref(), Some("data:audio/mpeg;base64,SUQz"));
    }

    #[tokio::test]
    async fn test_characters_are_per_book() {
        let (_, cache) = store();
        let characters = vec![Character::new("Ishmael", "A sailor")];
        cache.set(Namespace::Characters, &book(), 1, &characters).await;
        assert_eq!(cache.get::<Vec<Character>>(Namespace::Characters, &book(), 7).await, Some(characters));
    }

    #[tokio::test]
    async fn test_reads_prepopulated_entries() {
        let backend = Arc::new(MockBackend::with_entries([(
            "book-illustration-cache-MyBook-p1",
            "iVBORw0KGgo=",
        )]));
        let cache = CacheStore::new(backend, KeyStrategy::Title);
        assert!(cache.contains(Namespace::Illustration, &book(), 1).await);
        assert!(!cache.contains(Namespace::Asset, &book(), 1).await);
        assert_eq!(cache.get::<String>(Namespace::Illustration, &book(), 1).await.as_deref(), Some("iVBORw0KGgo="));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let backend = Arc::new(MockBackend::with_entries([("book-asset-cache-MyBook-p1", "{not json")]));
        let cache = CacheStore::new(backend, KeyStrategy::Title);
        assert_eq!(cache.get::<PageAsset>(Namespace::Asset, &book(), 1).await, None);
    }

    #[tokio::test]
    async fn test_storage_faults_never_surface() {
        let (backend, cache) = store();
        backend.fail_writes(true);
        cache.set(Namespace::Asset, &book(), 1, &PageAsset::new("AAAA", "")).await;
        assert_eq!(backend.peek("book-asset-cache-MyBook-p1").await, None);

        backend.fail_writes(false);
        cache.set(Namespace::Asset, &book(), 1, &PageAsset::new("AAAA", "")).await;
        backend.fail_reads(true);
        assert_eq!(cache.get::<PageAsset>(Namespace::Asset, &book(), 1).await, None);
        assert!(!cache.contains(Namespace::Asset, &book(), 1).await);
        backend.fail_writes(true);
        assert_eq!(cache.clear(Namespace::Asset).await, 0);
        assert!(backend.peek("book-asset-cache-MyBook-p1").await.is_some());
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_a_noop() {
        let backend = Arc::new(MockBackend::default().with_quota(8));
        let cache = CacheStore::new(backend.clone(), KeyStrategy::Title);
        cache.set(Namespace::Asset, &book(), 1, &PageAsset::new("A".repeat(64), "")).await;
        assert_eq!(backend.peek("book-asset-cache-MyBook-p1").await, None);
        assert_eq!(cache.get::<PageAsset>(Namespace::Asset, &book(), 1).await, None);
    }

    #[tokio::test]
    async fn test_read_only_backend_drops_writes() {
        let inner = Arc::new(MockBackend::default());
        let cache = CacheStore::new(Arc::new(ReadOnlyBackend::new(inner.clone())), KeyStrategy::Title);
        cache.set(Namespace::Sound, &book(), 1, &SoundClip("data:audio/mpeg;base64,AA".into())).await;
        assert_eq!(inner.writes(), 0);
        assert_eq!(cache.get::<SoundClip>(Namespace::Sound, &book(), 1).await, None);
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_namespace() {
        let (backend, cache) = store();
        cache.set(Namespace::Asset, &book(), 1, &PageAsset::new("AAAA", "")).await;
        cache.set(Namespace::Asset, &book(), 2, &PageAsset::new("BBBB", "")).await;
        cache.set(Namespace::Sound, &book(), 1, &SoundClip("data:audio/mpeg;base64,AA".into())).await;
        assert_eq!(cache.clear(Namespace::Asset).await, 2);
        assert!(!cache.contains(Namespace::Asset, &book(), 1).await);
        assert!(backend.peek("book-sound-cache-MyBook-p1").await.is_some());
    }

    #[tokio::test]
    async fn test_fingerprint_strategy() {
        let backend = Arc::new(MockBackend::default());
        let cache = CacheStore::new(backend.clone(), KeyStrategy::Fingerprint);
        let book = book();
        cache.set(Namespace::Asset, &book, 1, &PageAsset::new("AAAA", "")).await;
        assert!(backend.peek(&format!("book-asset-cache-{}-p1", book.fingerprint)).await.is_some());
        assert_eq!(cache.strategy(), KeyStrategy::Fingerprint);
    }
}
