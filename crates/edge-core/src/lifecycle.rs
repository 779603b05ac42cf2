//! Request lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Lifecycle phases of one request through the cache layer.
///
/// `Stored` and `StoreFailed` happen after `Responded`, in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Request received, method classified.
    Received,
    /// Cache key derived.
    KeyBuilt,
    /// Served from cache.
    CacheHit,
    /// Not in cache (or the lookup failed).
    CacheMiss,
    /// Method is neither a cacheable read nor body-bearing.
    Bypassed,
    /// Origin returned a response.
    OriginFetched,
    /// Freshness policy attached.
    Decorated,
    /// Response handed to the client.
    Responded,
    /// Background cache write completed.
    Stored,
    /// Background cache write failed.
    StoreFailed,
}

impl LifecyclePhase {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::KeyBuilt => "key_built",
            Self::CacheHit => "cache_hit",
            Self::CacheMiss => "cache_miss",
            Self::Bypassed => "bypassed",
            Self::OriginFetched => "origin_fetched",
            Self::Decorated => "decorated",
            Self::Responded => "responded",
            Self::Stored => "stored",
            Self::StoreFailed => "store_failed",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<LifecyclePhase, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record when a lifecycle phase was reached.
    pub fn mark_phase(&mut self, phase: LifecyclePhase) {
        self.marks.insert(phase, Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start until the client was answered.
    pub fn time_to_response(&self) -> Option<Duration> {
        self.marks
            .get(&LifecyclePhase::Responded)
            .map(|t| t.duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LifecyclePhase);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_phase() {
        let mut timing = TimingContext::new();
        assert!(timing.time_to_response().is_none());
        timing.mark_phase(LifecyclePhase::CacheMiss);
        assert!(timing.time_to_response().is_none());
        timing.mark_phase(LifecyclePhase::Responded);
        assert!(timing.time_to_response().unwrap() <= timing.elapsed());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::CacheHit.to_string(), "cache_hit");
        assert_eq!(LifecyclePhase::StoreFailed.name(), "store_failed");
    }
}
