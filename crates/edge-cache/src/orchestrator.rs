//! Per-request cache decision flow.
//!
//! Idempotent reads are keyed on the URL under the alternate hostname and
//! decorated with `Cache-Control: max-age` before they are stored.
//! Body-bearing requests are keyed on a digest of their body and stored as
//! the origin sent them. Every other method bypasses the cache.

use std::sync::Arc;

use edge_core::{LifecycleObserver, LifecyclePhase, Request, Response};
use edge_data::{FetchError, OriginFetcher};

use crate::config::{CacheConfig, ConfigError};
use crate::digest::ContentDigest;
use crate::headers::{apply_debug_headers, should_include_debug_headers, CacheStatus};
use crate::key::{CacheKey, CacheKeyBuilder, KeyError};
use crate::policy::FreshnessPolicy;
use crate::spawn::TaskSpawner;
use crate::store::CacheStore;

/// Failures that reach the client as an error response.
///
/// Cache store failures never appear here: a failed lookup is a miss and a
/// failed write is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    #[error("{0}")]
    Origin(#[from] FetchError),

    #[error("{0}")]
    InvalidKey(#[from] KeyError),
}

impl EdgeError {
    /// Status code reported to the client.
    pub fn status(&self) -> u16 {
        match self {
            Self::Origin(_) => 502,
            Self::InvalidKey(_) => 500,
        }
    }

    /// Plain-text error response.
    pub fn into_response(self) -> Response {
        Response::text(self.status(), format!("Error thrown: {self}"))
    }
}

/// What a request path produced, before debug headers and background work.
struct Outcome {
    response: Response,
    status: CacheStatus,
    key: Option<CacheKey>,
    fill: Option<(CacheKey, Response)>,
}

/// Serves requests from the cache, falling back to a single origin fetch.
pub struct CacheOrchestrator {
    config: CacheConfig,
    keys: CacheKeyBuilder,
    freshness: FreshnessPolicy,
    store: Arc<dyn CacheStore>,
    origin: Arc<dyn OriginFetcher>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl CacheOrchestrator {
    /// Create an orchestrator after validating the configuration.
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn CacheStore>,
        origin: Arc<dyn OriginFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            keys: CacheKeyBuilder::new(config.alt_hostname.trim()),
            freshness: config.freshness_policy(),
            config,
            store,
            origin,
            observer: None,
        })
    }

    /// Report lifecycle phases to an observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Serve a request, converting failures into error responses.
    pub async fn respond(&self, request: Request, tasks: &dyn TaskSpawner) -> Response {
        match self.handle(request, tasks).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, status = e.status(), "request failed");
                e.into_response()
            }
        }
    }

    /// Serve a request.
    ///
    /// On a miss the origin is fetched exactly once and the cache write is
    /// handed to `tasks`; the returned response never waits for it.
    pub async fn handle(
        &self,
        request: Request,
        tasks: &dyn TaskSpawner,
    ) -> Result<Response, EdgeError> {
        self.observe(LifecyclePhase::Received);
        let debug = self.config.debug_headers && should_include_debug_headers(&request.headers);
        let method = request.method;
        tracing::debug!(%method, url = %request.url, "handling request");

        let outcome = if method.is_cacheable_read() {
            self.serve_read(request).await?
        } else if method.is_body_bearing() {
            self.serve_body_bearing(request).await?
        } else {
            self.bypass(request).await?
        };

        let Outcome {
            mut response,
            status,
            key,
            fill,
        } = outcome;

        if debug {
            response = apply_debug_headers(response, status, key.as_ref());
        }
        self.observe(LifecyclePhase::Responded);

        if let Some((key, cached)) = fill {
            self.schedule_store(tasks, key, cached);
        }

        Ok(response)
    }

    async fn serve_read(&self, request: Request) -> Result<Outcome, EdgeError> {
        let key = self.keys.get_key(&request)?;
        self.observe(LifecyclePhase::KeyBuilt);

        if let Some(hit) = self.lookup(&key).await {
            return Ok(self.hit(hit, key));
        }
        self.observe(LifecyclePhase::CacheMiss);

        let response = self.fetch_origin(request).await?;
        let response = self.freshness.decorate(response);
        self.observe(LifecyclePhase::Decorated);

        Ok(Self::miss(response, key))
    }

    async fn serve_body_bearing(&self, request: Request) -> Result<Outcome, EdgeError> {
        // The body is read once for the digest; the origin gets the other copy.
        let (hash_copy, for_origin) = request.tee();
        let digest = ContentDigest::of(&hash_copy.body.into_bytes());
        let key = self.keys.post_key(&for_origin, &digest);
        self.observe(LifecyclePhase::KeyBuilt);

        if let Some(hit) = self.lookup(&key).await {
            return Ok(self.hit(hit, key));
        }
        self.observe(LifecyclePhase::CacheMiss);

        let response = self.fetch_origin(for_origin).await?;
        Ok(Self::miss(response, key))
    }

    async fn bypass(&self, request: Request) -> Result<Outcome, EdgeError> {
        self.observe(LifecyclePhase::Bypassed);
        let response = self.fetch_origin(request).await?;
        Ok(Outcome {
            response,
            status: CacheStatus::Bypass,
            key: None,
            fill: None,
        })
    }

    fn hit(&self, response: Response, key: CacheKey) -> Outcome {
        self.observe(LifecyclePhase::CacheHit);
        tracing::debug!(key = %key, "cache hit");
        Outcome {
            response,
            status: CacheStatus::Hit,
            key: Some(key),
            fill: None,
        }
    }

    fn miss(response: Response, key: CacheKey) -> Outcome {
        let (to_client, to_cache) = response.tee();
        Outcome {
            response: to_client,
            status: CacheStatus::Miss,
            key: Some(key.clone()),
            fill: Some((key, to_cache)),
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Response> {
        match self.store.lookup(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_origin(&self, request: Request) -> Result<Response, EdgeError> {
        let response = self.origin.fetch(request).await?;
        self.observe(LifecyclePhase::OriginFetched);
        tracing::debug!(status = response.status, "origin responded");
        Ok(response)
    }

    fn schedule_store(&self, tasks: &dyn TaskSpawner, key: CacheKey, response: Response) {
        let store = Arc::clone(&self.store);
        let observer = self.observer.clone();

        tasks.spawn(Box::pin(async move {
            let phase = match store.store(&key, response).await {
                Ok(()) => {
                    tracing::debug!(key = %key, "cache write completed");
                    LifecyclePhase::Stored
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "cache write failed");
                    LifecyclePhase::StoreFailed
                }
            };
            if let Some(observer) = observer {
                observer.on_phase(phase);
            }
        }));
    }

    fn observe(&self, phase: LifecyclePhase) {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase);
        }
    }
}
