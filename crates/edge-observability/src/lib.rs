//! Logging and cache metrics for the edge cache and routing layer.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped logging emitted as `tracing` events
//! - `init_tracing` - Global subscriber setup (JSON or compact)
//! - `CacheMetrics` - Lifecycle observer counting hits, misses and cache writes
//! - `RequestMetrics` - Timing summary for one request

mod logging;
mod metrics;
mod telemetry;

pub use logging::*;
pub use metrics::*;
pub use telemetry::*;

// Re-export RequestId and TimingContext from edge-core for convenience
pub use edge_core::{RequestId, TimingContext};
