//! Spin HTTP entry point.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::SinkExt;
use spin_sdk::http::{Fields, IncomingRequest, Method as SpinMethod, OutgoingResponse, ResponseOutparam};
use spin_sdk::http_component;
use url::Url;

use edge_sdk::edge_cache::{DeferredTasks, KvStore};
use edge_sdk::edge_core::{Headers, Method, Request, Response};
use edge_sdk::edge_data::{is_forbidden_header, SpinOriginClient};
use edge_sdk::edge_observability::init_tracing;

use crate::config::EdgeConfig;
use crate::router::{client_info_from_headers, EdgeRouter};

#[http_component]
async fn handle_edge(req: IncomingRequest, response_out: ResponseOutparam) {
    let tasks = DeferredTasks::new();

    let response = match serve(req, &tasks).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "request setup failed");
            Response::text(500, format!("Error thrown: {e}"))
        }
    };

    send_response(response, response_out).await;

    // Cache writes run after the client has its response.
    tasks.drain().await;
}

async fn serve(req: IncomingRequest, tasks: &DeferredTasks) -> Result<Response> {
    let config = EdgeConfig::embedded()?;
    // A warm instance already has a subscriber installed.
    let _ = init_tracing(&config.logging);

    let store = Arc::new(KvStore::open_default(config.cache.default_retention()));
    let router = EdgeRouter::new(config, store, SpinOriginClient::new())?;

    match into_request(req).await? {
        Some(request) => Ok(router.handle(request, tasks).await),
        None => Ok(Response::text(405, "Method Not Allowed")),
    }
}

/// Convert the inbound Spin request, or `None` for unsupported methods.
async fn into_request(req: IncomingRequest) -> Result<Option<Request>> {
    let method = match req.method() {
        SpinMethod::Get => Method::Get,
        SpinMethod::Head => Method::Head,
        SpinMethod::Post => Method::Post,
        SpinMethod::Put => Method::Put,
        SpinMethod::Patch => Method::Patch,
        SpinMethod::Delete => Method::Delete,
        SpinMethod::Options => Method::Options,
        _ => return Ok(None),
    };

    let uri = req.uri();
    let url = Url::parse(&uri).with_context(|| format!("Invalid request URI: {uri}"))?;

    let headers: Headers = req
        .headers()
        .entries()
        .into_iter()
        .map(|(name, value)| (name, String::from_utf8_lossy(&value).into_owned()))
        .collect();

    let body = req
        .into_body()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {e:?}"))?;

    let client = client_info_from_headers(&headers);
    let mut request = Request::new(method, url).with_body(body).with_client(client);
    request.headers = headers;
    Ok(Some(request))
}

async fn send_response(response: Response, response_out: ResponseOutparam) {
    let header_list: Vec<(String, Vec<u8>)> = response
        .headers
        .iter()
        .filter(|(name, _)| !is_forbidden_header(name))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_bytes().to_vec()))
        .collect();

    let headers = Fields::from_list(&header_list).unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "dropping invalid response headers");
        Fields::new()
    });

    let outgoing = OutgoingResponse::new(headers);
    if outgoing.set_status_code(response.status).is_err() {
        tracing::warn!(status = response.status, "invalid response status");
    }

    let mut body = outgoing.take_body();
    response_out.set(outgoing);

    if let Err(e) = body.send(response.body.into_bytes()).await {
        tracing::warn!(error = %e, "failed to write response body");
    }
}
