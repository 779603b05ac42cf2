//! Cache store backed by Spin's Key-Value Store.

use std::time::Duration;

use async_trait::async_trait;
use edge_core::Response;

use crate::entry::{current_timestamp, CachedResponse};
use crate::key::CacheKey;
use crate::policy::Freshness;
use crate::store::{CacheError, CacheResult, CacheStore};

/// Cache store persisted in a Spin key-value store.
///
/// The store is opened per operation so the adapter stays `Send + Sync`.
/// Entries carry their own `stored_at`/`ttl_secs`; expired entries are
/// deleted on lookup.
#[derive(Debug, Clone)]
pub struct KvStore {
    label: Option<String>,
    default_retention: Duration,
}

impl KvStore {
    /// Use the component's default key-value store.
    pub fn open_default(default_retention: Duration) -> Self {
        Self {
            label: None,
            default_retention,
        }
    }

    /// Use a named key-value store.
    pub fn open(label: impl Into<String>, default_retention: Duration) -> Self {
        Self {
            label: Some(label.into()),
            default_retention,
        }
    }

    fn store(&self) -> CacheResult<spin_sdk::key_value::Store> {
        let opened = match &self.label {
            Some(label) => spin_sdk::key_value::Store::open(label),
            None => spin_sdk::key_value::Store::open_default(),
        };
        opened.map_err(|e| CacheError::Open(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for KvStore {
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let store = self.store()?;
        let storage_key = key.storage_key();

        let Some(bytes) = store
            .get(&storage_key)
            .map_err(|e| CacheError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        let entry = CachedResponse::from_bytes(&bytes)?;
        if entry.is_expired(current_timestamp()) {
            if let Err(e) = store.delete(&storage_key) {
                tracing::warn!(key = %key, error = %e, "failed to delete expired cache entry");
            }
            return Ok(None);
        }

        Ok(Some(entry.to_response()))
    }

    async fn store(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        let Some(ttl) = Freshness::from_headers(&response.headers)
            .retention(self.default_retention)
            .filter(|ttl| !ttl.is_zero())
        else {
            return Ok(());
        };

        let entry = CachedResponse::new(response, ttl, current_timestamp());
        self.store()?
            .set(&key.storage_key(), &entry.to_bytes()?)
            .map_err(|e| CacheError::Storage(e.to_string()))
    }
}
