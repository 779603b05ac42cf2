//! Cache debugging headers.

use edge_core::{Headers, Response};
use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// Header names for cache debugging.
pub mod header_names {
    /// Cache status header (HIT, MISS, BYPASS).
    pub const X_CACHE_STATUS: &str = "X-Cache-Status";
    /// Cache key used for lookup.
    pub const X_CACHE_KEY: &str = "X-Cache-Key";
    /// Request header opting in to debug headers.
    pub const X_DEBUG_CACHE: &str = "X-Debug-Cache";
}

/// How a request was served relative to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Fetched from the origin and scheduled for storage.
    Miss,
    /// Method not cached; origin response passed through.
    Bypass,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// Whether the client asked for debug headers.
pub fn should_include_debug_headers(request_headers: &Headers) -> bool {
    request_headers
        .get_all(header_names::X_DEBUG_CACHE)
        .any(|value| value.trim() == "1")
}

/// Add `X-Cache-Status` and, when a key was built, `X-Cache-Key`.
pub fn apply_debug_headers(
    mut response: Response,
    status: CacheStatus,
    key: Option<&CacheKey>,
) -> Response {
    response
        .headers
        .insert(header_names::X_CACHE_STATUS, status.to_string());
    if let Some(key) = key {
        response
            .headers
            .insert(header_names::X_CACHE_KEY, key.storage_key());
    }
    response
}
