//! Edge cache and conditional-routing workload.
//!
//! Every request first runs through the configured rule chain; requests no
//! rule answers are served by the cache orchestrator, which fetches from the
//! origin (after hostname rewrites) on a miss and fills the Spin key-value
//! store once the response has been sent.

mod config;
mod router;

#[cfg(target_arch = "wasm32")]
mod component;

pub use config::*;
pub use router::*;
