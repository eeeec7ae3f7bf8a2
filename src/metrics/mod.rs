//! Prometheus metrics for the visitor backend.
//!
//! # Metrics Exposed
//!
//! - `gate_pass_registrations_total` - Visitors stored
//! - `gate_pass_login_attempts_total` - Login requests
//! - `gate_pass_login_failures_total` - Rejected logins
//! - `gate_pass_searches_total` - Previous-visit lookups
//! - `gate_pass_search_misses_total` - Lookups with no match
//! - `gate_pass_register_queries_total` - Daily register requests
//! - `gate_pass_register_rows` - Rows in the latest daily register
//!
//! # Example
//!
//! ```
//! use gate_pass::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_login(true);
//! assert!(registry.encode().unwrap().contains("gate_pass_login_attempts_total 1"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
