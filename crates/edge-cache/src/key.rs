//! Cache key composition.

use edge_core::{Headers, Method, Request};
use url::Url;

use crate::digest::{digest, ContentDigest};

/// Path prefix under which body-addressed entries are stored.
pub const POST_KEY_PREFIX: &str = "/posts";

/// Errors from building a cache key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyError {
    #[error("invalid cache hostname {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },
}

/// A synthetic request descriptor used purely for lookup identity.
///
/// Never delivered to a client and never sent to an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    method: Method,
    url: Url,
    headers: Headers,
}

impl CacheKey {
    /// Create a key from its parts.
    pub fn new(method: Method, url: Url, headers: Headers) -> Self {
        Self {
            method,
            url,
            headers,
        }
    }

    /// Lookup method (always an idempotent read).
    pub fn method(&self) -> Method {
        self.method
    }

    /// Lookup URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers that take part in the key's identity.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Stable string identity used by stores.
    ///
    /// `"{METHOD} {url}"`, followed by `" h:"` and a SHA-256 of the
    /// canonical header list when the key carries headers.
    pub fn storage_key(&self) -> String {
        let base = format!("{} {}", self.method, self.url);
        if self.headers.is_empty() {
            return base;
        }

        let mut pairs: Vec<(String, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        pairs.sort();

        let canonical: String = pairs
            .iter()
            .map(|(k, v)| format!("{k}:{v}\n"))
            .collect();

        format!("{} h:{}", base, digest(canonical.as_bytes()))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Key for an idempotent request: same URL with the host replaced.
///
/// Requests for the same path and query share a key regardless of the
/// hostname they arrived on, which namespaces this zone's entries under
/// `alt_hostname` in a store shared with other zones.
pub fn build_get_key(request: &Request, alt_hostname: &str) -> Result<CacheKey, KeyError> {
    let mut url = request.url.clone();
    url.set_host(Some(alt_hostname))
        .map_err(|e| KeyError::InvalidHost {
            host: alt_hostname.to_string(),
            reason: e.to_string(),
        })?;
    url.set_fragment(None);

    Ok(CacheKey::new(request.method, url, Headers::new()))
}

/// Key for a body-bearing request.
///
/// The body must already have been read and hashed: the path becomes
/// `/posts` + original path + digest, the method becomes GET, and every
/// request header is copied into the key verbatim.
pub fn build_post_key(request: &Request, digest: &ContentDigest) -> CacheKey {
    let mut url = request.url.clone();
    let path = format!("{}{}{}", POST_KEY_PREFIX, url.path(), digest);
    url.set_path(&path);
    url.set_fragment(None);

    CacheKey::new(Method::Get, url, request.headers.clone())
}

/// Builds cache keys for one zone.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    alt_hostname: String,
}

impl CacheKeyBuilder {
    /// Create a builder that namespaces idempotent keys under `alt_hostname`.
    pub fn new(alt_hostname: impl Into<String>) -> Self {
        Self {
            alt_hostname: alt_hostname.into(),
        }
    }

    /// The configured alternate hostname.
    pub fn alt_hostname(&self) -> &str {
        &self.alt_hostname
    }

    /// Key for an idempotent request.
    pub fn get_key(&self, request: &Request) -> Result<CacheKey, KeyError> {
        build_get_key(request, &self.alt_hostname)
    }

    /// Key for a body-bearing request whose body hashed to `digest`.
    pub fn post_key(&self, request: &Request, digest: &ContentDigest) -> CacheKey {
        build_post_key(request, digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn post(url: &str, body: &str) -> Request {
        Request::post(Url::parse(url).unwrap(), body)
    }

    #[test]
    fn test_get_key_replaces_host() {
        let key = build_get_key(&get("https://cache.zone/foo?x=1"), "origin.example.com").unwrap();
        assert_eq!(key.url().as_str(), "https://origin.example.com/foo?x=1");
        assert_eq!(key.method(), Method::Get);
        assert!(key.headers().is_empty());
    }

    #[test]
    fn test_get_key_ignores_inbound_host() {
        let a = build_get_key(&get("https://a.example.com/foo?x=1"), "my.herokuapp.com").unwrap();
        let b = build_get_key(&get("https://b.example.com/foo?x=1"), "my.herokuapp.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn test_get_key_distinguishes_query() {
        let a = build_get_key(&get("https://a.example.com/foo?x=1"), "alt.example").unwrap();
        let b = build_get_key(&get("https://a.example.com/foo?x=2"), "alt.example").unwrap();
        assert_ne!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn test_get_key_ignores_request_headers() {
        let a = get("https://a.example.com/p").with_header("Cookie", "id=1");
        let b = get("https://a.example.com/p").with_header("Cookie", "id=2");
        assert_eq!(
            build_get_key(&a, "alt.example").unwrap(),
            build_get_key(&b, "alt.example").unwrap()
        );
    }

    #[test]
    fn test_get_key_invalid_host() {
        let err = build_get_key(&get("https://a.example.com/"), "bad host").unwrap_err();
        assert!(matches!(err, KeyError::InvalidHost { .. }));
    }

    #[test]
    fn test_post_key_path_embeds_digest() {
        let req = post("https://a.example.com/submit", "hello");
        let d = ContentDigest::of(b"hello");
        let key = build_post_key(&req, &d);

        assert_eq!(key.method(), Method::Get);
        assert_eq!(key.url().path(), format!("/posts/submit{}", d));
        assert_eq!(key.url().host_str(), Some("a.example.com"));
    }

    #[test]
    fn test_post_key_keeps_query() {
        let req = post("https://a.example.com/submit?v=2", "x");
        let key = build_post_key(&req, &ContentDigest::of(b"x"));
        assert_eq!(key.url().query(), Some("v=2"));
    }

    #[test]
    fn test_post_keys_same_body_collide() {
        let d = ContentDigest::of(b"same");
        let a = build_post_key(&post("https://a.example.com/submit", "same"), &d);
        let b = build_post_key(&post("https://a.example.com/submit", "same"), &d);
        assert_eq!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn test_post_keys_different_body_differ() {
        let a = build_post_key(
            &post("https://a.example.com/submit", "one"),
            &ContentDigest::of(b"one"),
        );
        let b = build_post_key(
            &post("https://a.example.com/submit", "two"),
            &ContentDigest::of(b"two"),
        );
        assert_ne!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn test_post_key_headers_affect_identity() {
        let d = ContentDigest::of(b"x");
        let a = post("https://a.example.com/s", "x").with_header("Cookie", "id=1");
        let b = post("https://a.example.com/s", "x").with_header("Cookie", "id=2");
        assert_ne!(
            build_post_key(&a, &d).storage_key(),
            build_post_key(&b, &d).storage_key()
        );
    }

    #[test]
    fn test_storage_key_header_order_and_case_insensitive() {
        let d = ContentDigest::of(b"x");
        let a = post("https://a.example.com/s", "x")
            .with_header("Accept", "text/html")
            .with_header("X-Token", "t");
        let b = post("https://a.example.com/s", "x")
            .with_header("x-token", "t")
            .with_header("accept", "text/html");
        assert_eq!(
            build_post_key(&a, &d).storage_key(),
            build_post_key(&b, &d).storage_key()
        );
    }

    #[test]
    fn test_storage_key_without_headers() {
        let key = build_get_key(&get("https://a.example.com/foo"), "alt.example").unwrap();
        assert_eq!(key.storage_key(), "GET https://alt.example/foo");
    }

    #[test]
    fn test_builder_delegates() {
        let builder = CacheKeyBuilder::new("alt.example");
        let key = builder.get_key(&get("https://a.example.com/foo")).unwrap();
        assert_eq!(key.url().host_str(), Some("alt.example"));
        assert_eq!(builder.alt_hostname(), "alt.example");
    }
}
