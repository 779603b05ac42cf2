//! Core abstractions for the edge cache and routing layer.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Request` / `Response` - Owned HTTP messages with move-only bodies
//! - `Body` - Single-consumption payload with an explicit `tee`
//! - `Headers` - Ordered, case-insensitive header list
//! - `RequestId` - Per-request identifier for log correlation
//! - `LifecyclePhase` - Per-request cache state machine tracking

mod body;
mod context;
mod headers;
mod lifecycle;
mod message;

pub use body::*;
pub use context::*;
pub use headers::*;
pub use lifecycle::*;
pub use message::*;
