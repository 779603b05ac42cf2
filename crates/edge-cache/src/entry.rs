//! Serialized form of a cached response.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use edge_core::{Headers, Response};
use serde::{Deserialize, Serialize};

/// A cached response as persisted by byte-oriented stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, in order.
    pub headers: Headers,
    /// Response body.
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    /// When the entry was created (seconds since epoch).
    pub stored_at: u64,
    /// Time-to-live in seconds.
    pub ttl_secs: u64,
}

impl CachedResponse {
    /// Capture a response for storage.
    pub fn new(response: Response, ttl: Duration, stored_at: u64) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body.into_bytes(),
            stored_at,
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Check if the entry has expired at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.stored_at.saturating_add(self.ttl_secs)
    }

    /// Rebuild a response with a fresh, readable body.
    pub fn to_response(&self) -> Response {
        Response::new(self.status, self.headers.clone(), self.body.clone())
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Current time in seconds since the Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

mod body_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
