//! Origin access for the edge cache layer.
//!
//! This crate provides:
//! - `OriginFetcher` - Forward a request to the origin
//! - `SpinOriginClient` - Spin outbound HTTP implementation (wasm32)
//! - `OriginMap` - Exact-match hostname to origin table
//! - `ProxyFetcher` - Rewrites mapped hostnames, then forwards

mod client;
mod proxy;

pub use client::*;
pub use proxy::*;
