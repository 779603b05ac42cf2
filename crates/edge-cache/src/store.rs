//! Cache store adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use edge_core::{Headers, Response};

use crate::key::CacheKey;
use crate::policy::Freshness;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to open the backing store.
    #[error("failed to open store: {0}")]
    Open(String),

    /// Failed to serialize/deserialize cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Key to response cache shared by concurrent requests.
///
/// Implementations own expiry: a lookup never returns an entry past the
/// freshness recorded when it was stored. A stored entry must be visible
/// to later lookups.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a fresh cached response.
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>>;

    /// Store a response under a key.
    async fn store(&self, key: &CacheKey, response: Response) -> CacheResult<()>;
}

struct MemoryEntry {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    expires_at: Instant,
}

/// In-process cache store.
///
/// Retention follows the stored response's `Cache-Control`; responses
/// without `max-age` are kept for the default retention, and `no-store`
/// responses are not kept at all. Expired entries are evicted on lookup.
pub struct InMemoryStore {
    entries: DashMap<String, MemoryEntry>,
    default_retention: Duration,
}

impl InMemoryStore {
    /// Create a store with a default retention for responses without `max-age`.
    pub fn new(default_retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_retention,
        }
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let storage_key = key.storage_key();
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&storage_key) {
            if now < entry.expires_at {
                return Ok(Some(Response::new(
                    entry.status,
                    entry.headers.clone(),
                    entry.body.clone(),
                )));
            }
        }

        self.entries
            .remove_if(&storage_key, |_, entry| now >= entry.expires_at);
        Ok(None)
    }

    async fn store(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        let retention = match Freshness::from_headers(&response.headers)
            .retention(self.default_retention)
        {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => {
                tracing::debug!(key = %key, "response not cacheable, skipping store");
                return Ok(());
            }
        };

        self.entries.insert(
            key.storage_key(),
            MemoryEntry {
                status: response.status,
                headers: response.headers,
                body: response.body.into_bytes(),
                expires_at: Instant::now() + retention,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::build_get_key;
    use edge_core::Request;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        let req = Request::get(Url::parse(&format!("https://zone.example{path}")).unwrap());
        build_get_key(&req, "alt.example").unwrap()
    }

    #[tokio::test]
    async fn test_store_then_lookup_round_trip() {
        let store = InMemoryStore::default();
        let resp = Response::text(200, "hello")
            .with_header("Cache-Control", "max-age=10")
            .with_header("X-Origin", "a");

        store.store(&key("/a"), resp).await.unwrap();

        let hit = store.lookup(&key("/a")).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.header("x-origin"), Some("a"));
        assert_eq!(hit.header("cache-control"), Some("max-age=10"));
        assert_eq!(hit.body.text().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let store = InMemoryStore::default();
        assert!(store.lookup(&key("/missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_returns_independent_copies() {
        let store = InMemoryStore::default();
        store
            .store(&key("/a"), Response::text(200, "body"))
            .await
            .unwrap();

        let first = store.lookup(&key("/a")).await.unwrap().unwrap();
        let second = store.lookup(&key("/a")).await.unwrap().unwrap();
        assert_eq!(first.body.into_bytes(), second.body.into_bytes());
    }

    #[tokio::test]
    async fn test_no_store_not_kept() {
        let store = InMemoryStore::default();
        let resp = Response::text(200, "secret").with_header("Cache-Control", "no-store");
        store.store(&key("/a"), resp).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_age_not_kept() {
        let store = InMemoryStore::default();
        let resp = Response::text(200, "stale").with_header("Cache-Control", "max-age=0");
        store.store(&key("/a"), resp).await.unwrap();
        assert!(store.lookup(&key("/a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_evicted() {
        let store = InMemoryStore::new(Duration::from_millis(20));
        store
            .store(&key("/a"), Response::text(200, "short"))
            .await
            .unwrap();
        assert!(store.lookup(&key("/a")).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.lookup(&key("/a")).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_same_key() {
        let store = InMemoryStore::default();
        store.store(&key("/a"), Response::text(200, "one")).await.unwrap();
        store.store(&key("/a"), Response::text(200, "two")).await.unwrap();

        assert_eq!(store.len(), 1);
        let hit = store.lookup(&key("/a")).await.unwrap().unwrap();
        assert_eq!(hit.body.text().unwrap(), "two");
    }
}
