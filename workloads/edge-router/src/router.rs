//! Request pipeline: rules, then the cache.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};

use edge_sdk::edge_cache::{CacheOrchestrator, CacheStore, TaskSpawner};
use edge_sdk::edge_core::{
    ClientInfo, Headers, LifecyclePhase, Request, RequestId, Response, TimingContext,
};
use edge_sdk::edge_data::{OriginFetcher, ProxyFetcher};
use edge_sdk::edge_observability::{
    CacheMetrics, LogBuilder, LogLevel, MetricsSnapshot, RequestMetrics, StructuredLogger,
};
use edge_sdk::edge_security::RuleSet;

use crate::config::EdgeConfig;

/// Workload name used in logs.
pub const WORKLOAD: &str = "edge-router";

/// Routes each request through the rule chain and then the cache.
pub struct EdgeRouter {
    rules: RuleSet,
    cache: CacheOrchestrator,
    metrics: Arc<CacheMetrics>,
    min_level: LogLevel,
}

impl EdgeRouter {
    /// Build the pipeline. Origin fetches go through `client` after the
    /// configured hostname rewrites.
    pub fn new<F>(config: EdgeConfig, store: Arc<dyn CacheStore>, client: F) -> Result<Self>
    where
        F: OriginFetcher + 'static,
    {
        let EdgeConfig {
            cache,
            origins,
            rules,
            logging,
        } = config;
        rules.validate().context("Invalid [[rules]]")?;

        let metrics = Arc::new(CacheMetrics::new());
        let origin = Arc::new(ProxyFetcher::new(client, origins));
        let cache = CacheOrchestrator::new(cache, store, origin)
            .context("Invalid [cache] section")?
            .with_observer(metrics.clone());

        Ok(Self {
            rules,
            cache,
            metrics,
            min_level: logging.level,
        })
    }

    /// Cache outcome counters since startup.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Serve one request. Background cache writes go to `tasks`.
    pub async fn handle(&self, request: Request, tasks: &dyn TaskSpawner) -> Response {
        let mut timing = TimingContext::new();
        let request_id = RequestId::from_header(request.header("X-Request-ID"));
        let route = request.url.path().to_string();
        let logger = StructuredLogger::new(request_id.clone())
            .with_workload(WORKLOAD)
            .with_route(&route)
            .with_min_level(self.min_level);

        let (response, answered_by) = match self.rules.evaluate(&request) {
            Some(response) => (response, "rule"),
            None => (self.cache.respond(request, tasks).await, "cache"),
        };

        timing.mark_phase(LifecyclePhase::Responded);

        let summary = RequestMetrics::finish(&request_id, Some(&route), response.status, &timing);
        summary_entry(&logger, &summary)
            .field("answered_by", answered_by)
            .emit();

        response
    }
}

/// Per-request summary entry, logged at a level matching the status.
fn summary_entry<'a>(logger: &'a StructuredLogger, summary: &RequestMetrics) -> LogBuilder<'a> {
    let mut entry = LogBuilder::new(
        logger,
        LogLevel::for_status(summary.status_code),
        "request completed",
    )
    .field_u64("status", u64::from(summary.status_code))
    .field_u64("duration_us", summary.total_duration_us);
    if let Some(us) = summary.time_to_response_us {
        entry = entry.field_u64("time_to_response_us", us);
    }
    entry
}

/// Client connection facts forwarded by the platform as request headers.
///
/// IP comes from `CF-Connecting-IP`, falling back to Spin's
/// `spin-client-addr` (`ip:port`). ASN and device class come from `CF-ASN`
/// and `CF-Device-Type`.
pub fn client_info_from_headers(headers: &Headers) -> ClientInfo {
    let ip = headers
        .get("CF-Connecting-IP")
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers.get("spin-client-addr").and_then(|v| {
                let v = v.trim();
                v.parse::<SocketAddr>()
                    .map(|addr| addr.ip())
                    .or_else(|_| v.parse::<IpAddr>())
                    .ok()
            })
        });

    ClientInfo {
        ip,
        asn: headers.get("CF-ASN").and_then(|v| v.trim().parse().ok()),
        device_type: headers
            .get("CF-Device-Type")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edge_sdk::edge_cache::{DeferredTasks, InMemoryStore};
    use edge_sdk::edge_data::FetchError;
    use std::sync::Mutex;
    use url::Url;

    #[derive(Clone, Default)]
    struct StubOrigin {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl OriginFetcher for StubOrigin {
        async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
            self.seen.lock().unwrap().push(request.url.to_string());
            Ok(Response::text(200, "from origin"))
        }
    }

    fn router(origin: StubOrigin) -> EdgeRouter {
        let config = EdgeConfig::from_toml_str(
            r#"
            [cache]
            alt_hostname = "origin.example.com"

            [origins]
            "cache.zone" = "origin.example.com"

            [[rules]]
            kind = "blocked_hosts"
            hosts = ["nope.mywebsite.com"]
            action = { type = "respond", status = 403, body = "Blocked Host" }

            [[rules]]
            kind = "device_type"
            device_type = "mobile"
            action = { type = "redirect", location = "https://mobile.example.com" }
            "#,
        )
        .unwrap();
        EdgeRouter::new(config, Arc::new(InMemoryStore::default()), origin).unwrap()
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_rule_short_circuits_cache() {
        let origin = StubOrigin::default();
        let router = router(origin.clone());
        let tasks = DeferredTasks::new();

        let resp = router.handle(get("https://nope.mywebsite.com/"), &tasks).await;

        assert_eq!(resp.status, 403);
        assert_eq!(resp.body.text().unwrap(), "Blocked Host");
        assert!(origin.seen.lock().unwrap().is_empty());
        assert_eq!(router.metrics().requests, 0);
    }

    #[tokio::test]
    async fn test_mobile_redirect_uses_client_info() {
        let router = router(StubOrigin::default());
        let tasks = DeferredTasks::new();
        let request = get("https://cache.zone/").with_header("CF-Device-Type", "Mobile");
        let client = client_info_from_headers(&request.headers);

        let resp = router.handle(request.with_client(client), &tasks).await;
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("location"), Some("https://mobile.example.com"));
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let origin = StubOrigin::default();
        let router = router(origin.clone());
        let tasks = DeferredTasks::new();

        let first = router.handle(get("https://cache.zone/foo?x=1"), &tasks).await;
        assert_eq!(first.header("cache-control"), Some("max-age=10"));
        tasks.drain().await;

        let second = router.handle(get("https://cache.zone/foo?x=1"), &tasks).await;
        assert_eq!(second.body.text().unwrap(), "from origin");

        assert_eq!(
            *origin.seen.lock().unwrap(),
            vec!["https://origin.example.com/foo?x=1"]
        );
        let snap = router.metrics();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.stores, 1);
    }

    #[test]
    fn test_summary_entry_reports_time_to_response() {
        let logger = StructuredLogger::new(RequestId::from_string("req-1"));
        let mut timing = TimingContext::new();
        timing.mark_phase(LifecyclePhase::Responded);
        let summary = RequestMetrics::finish(logger.request_id(), Some("/foo"), 502, &timing);

        let entry = summary_entry(&logger, &summary);
        assert_eq!(entry.fields()["status"], 502);
        assert!(entry.fields().contains_key("time_to_response_us"));
        assert!(entry.fields().contains_key("duration_us"));
    }

    #[test]
    fn test_client_info_from_headers() {
        let headers: Headers = [
            ("CF-Connecting-IP", "1.2.3.4"),
            ("CF-ASN", "64512"),
            ("CF-Device-Type", "mobile"),
        ]
        .into_iter()
        .collect();

        let info = client_info_from_headers(&headers);
        assert_eq!(info.ip, Some("1.2.3.4".parse().unwrap()));
        assert_eq!(info.asn, Some(64512));
        assert_eq!(info.device_type.as_deref(), Some("mobile"));
    }

    #[test]
    fn test_client_ip_falls_back_to_spin_addr() {
        let headers: Headers = [("spin-client-addr", "10.0.0.7:51234")].into_iter().collect();
        let info = client_info_from_headers(&headers);
        assert_eq!(info.ip, Some("10.0.0.7".parse().unwrap()));
        assert_eq!(info.asn, None);
        assert_eq!(info.device_type, None);
    }
}
