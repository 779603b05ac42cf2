//! Public SDK for the edge cache and routing layer.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use std::sync::Arc;
//! use edge_sdk::prelude::*;
//!
//! let origin = ProxyFetcher::new(
//!     SpinOriginClient::new(),
//!     OriginMap::new().with_origin("cache.zone", "origin.example.com"),
//! );
//! let config = CacheConfig::new("origin.example.com");
//! let store = Arc::new(InMemoryStore::new(config.default_retention()));
//! let orchestrator = CacheOrchestrator::new(config, store, Arc::new(origin))?
//!     .with_observer(Arc::new(CacheMetrics::new()));
//!
//! let tasks = DeferredTasks::new();
//! let response = orchestrator.respond(request, &tasks).await;
//! // hand `response` to the client, then:
//! tasks.drain().await;
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_data;
pub use edge_observability;
pub use edge_security;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_cache::*;
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_observability::*;
    pub use edge_security::*;
}
