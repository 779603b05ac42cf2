//! Request-time response caching for the edge routing layer.
//!
//! This crate provides:
//! - `ContentDigest` - SHA-256 content hashing for body-addressed keys
//! - `CacheKeyBuilder` - Lookup keys for idempotent and body-bearing requests
//! - `FreshnessPolicy` - `Cache-Control: max-age` decoration and parsing
//! - `CacheStore` - Async lookup/store adapter (`InMemoryStore`, `KvStore`)
//! - `TaskSpawner` - Fire-and-forget background cache writes
//! - `CacheOrchestrator` - The per-request cache decision flow
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edge_cache::{CacheConfig, CacheOrchestrator, InMemoryStore, TokioSpawner};
//! use edge_data::SpinOriginClient;
//!
//! let config = CacheConfig::new("my.herokuapp.com");
//! let store = Arc::new(InMemoryStore::new(config.default_retention()));
//! let orchestrator = CacheOrchestrator::new(config, store, Arc::new(SpinOriginClient::new()))?;
//!
//! let response = orchestrator.respond(request, &TokioSpawner).await;
//! ```

mod config;
mod digest;
mod entry;
mod headers;
mod key;
#[cfg(target_arch = "wasm32")]
mod kv;
mod orchestrator;
mod policy;
mod spawn;
mod store;

pub use config::*;
pub use digest::*;
pub use entry::*;
pub use headers::*;
pub use key::*;
#[cfg(target_arch = "wasm32")]
pub use kv::*;
pub use orchestrator::*;
pub use policy::*;
pub use spawn::*;
pub use store::*;
