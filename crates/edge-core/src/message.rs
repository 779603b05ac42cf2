//! HTTP request and response messages.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::body::Body;
use crate::headers::Headers;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether the request carries a body that identifies the resource.
    pub fn is_body_bearing(&self) -> bool {
        matches!(self, Self::Post)
    }

    /// Whether responses to this method may be served from cache by URL alone.
    pub fn is_cacheable_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Connection-level facts about the client, supplied by the edge platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address.
    pub ip: Option<IpAddr>,
    /// Autonomous system number of the client network.
    pub asn: Option<u32>,
    /// Device class reported by the platform (e.g. "mobile").
    pub device_type: Option<String>,
}

/// An inbound or outbound HTTP request.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Body,
    pub client: ClientInfo,
}

impl Request {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Body::empty(),
            client: ClientInfo::default(),
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request with a body.
    pub fn post(url: Url, body: impl Into<Body>) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set client connection info.
    pub fn with_client(mut self, client: ClientInfo) -> Self {
        self.client = client;
        self
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Split into two requests with independent bodies.
    pub fn tee(self) -> (Request, Request) {
        let (body, copy) = self.body.tee();
        let twin = Request {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: copy,
            client: self.client.clone(),
        };
        (
            Request {
                method: self.method,
                url: self.url,
                headers: self.headers,
                body,
                client: self.client,
            },
            twin,
        )
    }
}

/// An HTTP response.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: Headers, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a plain-text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain; charset=utf-8");
        Self::new(status, headers, body.into())
    }

    /// Create a redirect response.
    pub fn redirect(location: impl Into<String>, status: u16) -> Self {
        let mut headers = Headers::new();
        headers.insert("Location", location);
        Self::new(status, headers, Body::empty())
    }

    /// Add a header occurrence.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Split into two responses with independent bodies.
    pub fn tee(self) -> (Response, Response) {
        let (body, copy) = self.body.tee();
        let twin = Response {
            status: self.status,
            headers: self.headers.clone(),
            body: copy,
        };
        (
            Response {
                status: self.status,
                headers: self.headers,
                body,
            },
            twin,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_classification() {
        assert!(Method::Post.is_body_bearing());
        assert!(!Method::Get.is_body_bearing());
        assert!(Method::Get.is_cacheable_read());
        assert!(Method::Head.is_cacheable_read());
        assert!(!Method::Put.is_cacheable_read());
        assert!(!Method::Put.is_body_bearing());
    }

    #[test]
    fn test_request_tee() {
        let req = Request::post(url("https://a.example/submit"), "hello")
            .with_header("Cookie", "id=1");
        let (a, b) = req.tee();

        assert_eq!(a.url, b.url);
        assert_eq!(a.header("cookie"), Some("id=1"));
        assert_eq!(b.header("cookie"), Some("id=1"));
        assert_eq!(a.body.into_bytes(), b"hello");
        assert_eq!(b.body.into_bytes(), b"hello");
    }

    #[test]
    fn test_response_tee() {
        let resp = Response::text(201, "created").with_header("X-Id", "7");
        let (a, b) = resp.tee();

        assert_eq!(a.status, 201);
        assert_eq!(b.status, 201);
        assert_eq!(b.header("x-id"), Some("7"));
        assert_eq!(a.body.text().unwrap(), "created");
        assert_eq!(b.body.text().unwrap(), "created");
    }

    #[test]
    fn test_redirect() {
        let resp = Response::redirect("https://mobile.example.com", 302);
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("location"), Some("https://mobile.example.com"));
        assert!(resp.body.is_empty());
    }
}
