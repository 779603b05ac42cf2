//! Conditional request blocking for the edge cache and routing layer.
//!
//! This crate provides:
//! - `Condition` - Predicates over host, path extension, method, user agent and client facts
//! - `RuleAction` - Plain-text response or redirect returned when a rule fires
//! - `RuleSet` - Ordered, first-match-wins rule chain
//!
//! # Example
//!
//! ```ignore
//! use edge_security::{Condition, RuleAction, RuleSet};
//!
//! let rules = RuleSet::new()
//!     .with_rule(
//!         Condition::BlockedHosts { hosts: vec!["nope.mywebsite.com".into()] },
//!         RuleAction::respond(403, "Blocked Host"),
//!     )
//!     .with_rule(
//!         Condition::DeviceType { device_type: "mobile".into() },
//!         RuleAction::redirect("https://mobile.example.com"),
//!     );
//!
//! if let Some(response) = rules.evaluate(&request) {
//!     return response;
//! }
//! ```

mod rules;

pub use rules::*;
