//! Hostname-rewrite proxying to alternate origins.

use std::collections::BTreeMap;

use async_trait::async_trait;
use edge_core::{Request, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{FetchError, OriginFetcher};

/// Table mapping inbound hostnames to the origin hostname that serves them.
///
/// Matching is exact on the full hostname; there are no wildcards. Hostnames
/// are compared lowercased, as `Url` normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct OriginMap {
    entries: BTreeMap<String, String>,
}

impl OriginMap {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping.
    pub fn with_origin(mut self, host: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries
            .insert(host.into().to_ascii_lowercase(), target.into());
        self
    }

    /// Look up the origin for a hostname.
    pub fn target_for(&self, host: &str) -> Option<&str> {
        self.entries
            .get(&host.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Rewrite the URL's host in place if it is mapped.
    ///
    /// Returns `Ok(true)` when the URL was rewritten.
    pub fn rewrite(&self, url: &mut Url) -> Result<bool, FetchError> {
        let Some(target) = url.host_str().and_then(|h| self.target_for(h)) else {
            return Ok(false);
        };
        let target = target.to_string();
        url.set_host(Some(&target))
            .map_err(|e| FetchError::InvalidUrl(format!("{target}: {e}")))?;
        Ok(true)
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OriginMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for OriginMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<OriginMap> for BTreeMap<String, String> {
    fn from(map: OriginMap) -> Self {
        map.entries
    }
}

/// Fetcher that sends mapped hostnames to their alternate origin.
///
/// Requests for unmapped hosts are forwarded unmodified.
pub struct ProxyFetcher<F> {
    inner: F,
    origins: OriginMap,
}

impl<F: OriginFetcher> ProxyFetcher<F> {
    /// Wrap a fetcher with an origin table.
    pub fn new(inner: F, origins: OriginMap) -> Self {
        Self { inner, origins }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<F: OriginFetcher> OriginFetcher for ProxyFetcher<F> {
    async fn fetch(&self, mut request: Request) -> Result<Response, FetchError> {
        let from = request.url.host_str().unwrap_or_default().to_string();
        if self.origins.rewrite(&mut request.url)? {
            tracing::debug!(
                from = %from,
                to = request.url.host_str().unwrap_or_default(),
                "proxying to alternate origin"
            );
        }
        self.inner.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingFetcher {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OriginFetcher for RecordingFetcher {
        async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
            self.urls.lock().unwrap().push(request.url.to_string());
            Ok(Response::text(200, "ok"))
        }
    }

    fn origins() -> OriginMap {
        [
            ("starwarsapi.yourdomain.com", "swapi.co"),
            ("google.yourdomain.com", "google.com"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_target_for_exact_match_only() {
        let map = origins();
        assert_eq!(map.target_for("google.yourdomain.com"), Some("google.com"));
        assert_eq!(map.target_for("api.google.yourdomain.com"), None);
        assert_eq!(map.target_for("yourdomain.com"), None);
    }

    #[test]
    fn test_rewrite_keeps_path_and_query() {
        let mut url = Url::parse("https://starwarsapi.yourdomain.com/api/people/1?format=json").unwrap();
        assert!(origins().rewrite(&mut url).unwrap());
        assert_eq!(url.as_str(), "https://swapi.co/api/people/1?format=json");
    }

    #[test]
    fn test_rewrite_unmapped_is_noop() {
        let mut url = Url::parse("https://other.example.com/x").unwrap();
        assert!(!origins().rewrite(&mut url).unwrap());
        assert_eq!(url.as_str(), "https://other.example.com/x");
    }

    #[test]
    fn test_deserialize_from_toml() {
        let map: OriginMap = toml::from_str(r#""a.example.com" = "b.example.com""#).unwrap();
        assert_eq!(map.target_for("a.example.com"), Some("b.example.com"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_mixed_case_hosts_match() {
        let map: OriginMap =
            toml::from_str(r#""Google.YourDomain.com" = "google.com""#).unwrap();
        assert_eq!(map.target_for("google.yourdomain.com"), Some("google.com"));

        let mut url = Url::parse("https://GOOGLE.yourdomain.com/search").unwrap();
        assert!(map.rewrite(&mut url).unwrap());
        assert_eq!(url.as_str(), "https://google.com/search");
    }

    #[tokio::test]
    async fn test_proxy_rewrites_then_forwards() {
        let proxy = ProxyFetcher::new(RecordingFetcher::default(), origins());
        let req = Request::get(Url::parse("https://google.yourdomain.com/search?q=rust").unwrap());

        let resp = proxy.fetch(req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(
            proxy.inner.urls.lock().unwrap().as_slice(),
            ["https://google.com/search?q=rust"]
        );
    }

    #[tokio::test]
    async fn test_proxy_forwards_unmapped_unmodified() {
        let proxy = ProxyFetcher::new(RecordingFetcher::default(), origins());
        let req = Request::get(Url::parse("https://plain.example.com/").unwrap());

        proxy.fetch(req).await.unwrap();
        assert_eq!(
            proxy.inner.urls.lock().unwrap().as_slice(),
            ["https://plain.example.com/"]
        );
    }
}
