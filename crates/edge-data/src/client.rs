//! Origin fetch client.

use async_trait::async_trait;
use edge_core::{Request, Response};

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Forwards a request to an origin server.
///
/// Implementations send the request exactly once and return whatever the
/// origin answered, including non-2xx statuses. Only transport failures
/// become `FetchError`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait OriginFetcher: Send + Sync {
    /// Send the request and return the origin's response.
    async fn fetch(&self, request: Request) -> Result<Response, FetchError>;
}

/// Headers the host runtime sets itself and rejects on outbound requests.
pub const FORBIDDEN_OUTBOUND_HEADERS: &[&str] = &[
    "connection",
    "host",
    "http2-settings",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "transfer-encoding",
    "upgrade",
];

/// Whether a header must be dropped before an outbound send.
pub fn is_forbidden_header(name: &str) -> bool {
    FORBIDDEN_OUTBOUND_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Origin client backed by Spin outbound HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinOriginClient;

impl SpinOriginClient {
    /// Create a new client.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl OriginFetcher for SpinOriginClient {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        use edge_core::{Headers, Method};
        use spin_sdk::http::Method as SpinMethod;

        let method = match request.method {
            Method::Get => SpinMethod::Get,
            Method::Head => SpinMethod::Head,
            Method::Post => SpinMethod::Post,
            Method::Put => SpinMethod::Put,
            Method::Patch => SpinMethod::Patch,
            Method::Delete => SpinMethod::Delete,
            Method::Options => SpinMethod::Options,
        };

        let mut builder = spin_sdk::http::Request::builder();
        builder.method(method);
        builder.uri(request.url.as_str());
        for (name, value) in request.headers.iter() {
            if !is_forbidden_header(name) {
                builder.header(name, value);
            }
        }
        let outbound = builder.body(request.body.into_bytes()).build();

        let response: spin_sdk::http::Response = spin_sdk::http::send(outbound)
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = *response.status();
        let headers: Headers = response
            .headers()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        Ok(Response::new(status, headers, response.into_body()))
    }
}
