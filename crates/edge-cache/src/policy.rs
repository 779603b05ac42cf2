//! Freshness policy for cached responses.

use std::time::Duration;

use edge_core::{Headers, Response};

/// Header carrying the freshness policy.
pub const CACHE_CONTROL: &str = "Cache-Control";

/// Freshness attached to idempotent responses before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    ttl: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with a fixed time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// The policy TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `Cache-Control` value for this policy.
    pub fn header_value(&self) -> String {
        format!("max-age={}", self.ttl.as_secs())
    }

    /// Append the freshness header.
    ///
    /// Any `Cache-Control` the origin sent is kept; the new value is added
    /// as a further occurrence, never a replacement.
    pub fn decorate(&self, mut response: Response) -> Response {
        response.headers.append(CACHE_CONTROL, self.header_value());
        response
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// How long a store should keep a response, read from its headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Explicit `max-age`.
    MaxAge(Duration),
    /// No freshness information; the store's default retention applies.
    Unspecified,
    /// `no-store` was present.
    NoStore,
}

impl Freshness {
    /// Read every `Cache-Control` occurrence in order.
    ///
    /// `no-store` anywhere wins. Otherwise the first `max-age` found is used,
    /// so an origin's own policy precedes one appended by this layer.
    pub fn from_headers(headers: &Headers) -> Self {
        let mut max_age = None;

        for value in headers.get_all(CACHE_CONTROL) {
            for directive in value.split(',').map(str::trim) {
                let lower = directive.to_ascii_lowercase();
                if lower == "no-store" {
                    return Self::NoStore;
                }
                if max_age.is_none() {
                    if let Some(secs) = lower
                        .strip_prefix("max-age=")
                        .and_then(|v| v.trim_matches('"').parse::<u64>().ok())
                    {
                        max_age = Some(Duration::from_secs(secs));
                    }
                }
            }
        }

        match max_age {
            Some(ttl) => Self::MaxAge(ttl),
            None => Self::Unspecified,
        }
    }

    /// Retention to apply, or `None` when the response must not be stored.
    pub fn retention(&self, default: Duration) -> Option<Duration> {
        match self {
            Self::MaxAge(ttl) => Some(*ttl),
            Self::Unspecified => Some(default),
            Self::NoStore => None,
        }
    }
}
