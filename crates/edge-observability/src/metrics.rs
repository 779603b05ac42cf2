//! Cache outcome counters and per-request timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use edge_core::{LifecycleObserver, LifecyclePhase, RequestId, TimingContext};
use serde::{Deserialize, Serialize};

/// Counters for cache outcomes across requests.
///
/// Register it as the orchestrator's lifecycle observer.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    origin_fetches: AtomicU64,
    stores: AtomicU64,
    store_failures: AtomicU64,
}

/// Point-in-time copy of `CacheMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub origin_fetches: u64,
    pub stores: u64,
    pub store_failures: u64,
}

impl MetricsSnapshot {
    /// Share of cacheable lookups served from the cache.
    pub fn hit_ratio(&self) -> Option<f64> {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return None;
        }
        Some(self.hits as f64 / lookups as f64)
    }
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            origin_fetches: self.origin_fetches.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

impl LifecycleObserver for CacheMetrics {
    fn on_phase(&self, phase: LifecyclePhase) {
        let counter = match phase {
            LifecyclePhase::Received => &self.requests,
            LifecyclePhase::CacheHit => &self.hits,
            LifecyclePhase::CacheMiss => &self.misses,
            LifecyclePhase::Bypassed => &self.bypasses,
            LifecyclePhase::OriginFetched => &self.origin_fetches,
            LifecyclePhase::Stored => &self.stores,
            LifecyclePhase::StoreFailed => &self.store_failures,
            LifecyclePhase::KeyBuilt | LifecyclePhase::Decorated | LifecyclePhase::Responded => {
                return
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Timing summary for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetrics {
    /// Request ID for correlation.
    pub request_id: String,
    /// Route path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// HTTP status code.
    pub status_code: u16,
    /// Total handling time (microseconds).
    pub total_duration_us: u64,
    /// Time until the response was handed back (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_response_us: Option<u64>,
}

impl RequestMetrics {
    /// Summarize a finished request.
    pub fn finish(
        request_id: &RequestId,
        route: Option<&str>,
        status_code: u16,
        timing: &TimingContext,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            route: route.map(str::to_string),
            status_code,
            total_duration_us: duration_us(timing.elapsed()),
            time_to_response_us: timing.time_to_response().map(duration_us),
        }
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
pub(crate) fn duration_us(d: Duration) -> u64 {
    d.as_micros().min(u64::MAX as u128) as u64
}
