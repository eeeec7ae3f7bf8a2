//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for the visitor backend.
///
/// Cloning is cheap; clones update the same series.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    registrations_total: IntCounter,

    // Auth
    login_attempts_total: IntCounter,
    login_failures_total: IntCounter,

    // Lookups
    searches_total: IntCounter,
    search_misses_total: IntCounter,
    register_queries_total: IntCounter,
    register_rows: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with every metric registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let registrations_total = IntCounter::new(
            "gate_pass_registrations_total",
            "Total number of visitors stored",
        )?;
        let login_attempts_total = IntCounter::new(
            "gate_pass_login_attempts_total",
            "Total number of login requests",
        )?;
        let login_failures_total = IntCounter::new(
            "gate_pass_login_failures_total",
            "Total number of rejected logins",
        )?;
        let searches_total = IntCounter::new(
            "gate_pass_searches_total",
            "Total number of previous-visit lookups",
        )?;
        let search_misses_total = IntCounter::new(
            "gate_pass_search_misses_total",
            "Lookups that found no previous visit",
        )?;
        let register_queries_total = IntCounter::new(
            "gate_pass_register_queries_total",
            "Total number of daily register requests",
        )?;
        let register_rows = IntGauge::new(
            "gate_pass_register_rows",
            "Rows returned by the latest daily register request",
        )?;

        registry.register(Box::new(registrations_total.clone()))?;
        registry.register(Box::new(login_attempts_total.clone()))?;
        registry.register(Box::new(login_failures_total.clone()))?;
        registry.register(Box::new(searches_total.clone()))?;
        registry.register(Box::new(search_misses_total.clone()))?;
        registry.register(Box::new(register_queries_total.clone()))?;
        registry.register(Box::new(register_rows.clone()))?;

        Ok(Self {
            registry,
            registrations_total,
            login_attempts_total,
            login_failures_total,
            searches_total,
            search_misses_total,
            register_queries_total,
            register_rows,
        })
    }

    pub fn record_registration(&self) {
        self.registrations_total.inc();
    }

    pub fn record_login(&self, accepted: bool) {
        self.login_attempts_total.inc();
        if !accepted {
            self.login_failures_total.inc();
        }
    }

    pub fn record_search(&self, found: bool) {
        self.searches_total.inc();
        if !found {
            self.search_misses_total.inc();
        }
    }

    pub fn record_register_query(&self, rows: usize) {
        self.register_queries_total.inc();
        self.register_rows.set(rows as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_counters_follow_events() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_registration();
        registry.record_login(true);
        registry.record_login(false);
        registry.record_search(false);
        registry.record_register_query(7);

        let output = registry.encode().unwrap();
        assert!(output.contains("gate_pass_registrations_total 1"));
        assert!(output.contains("gate_pass_login_attempts_total 2"));
        assert!(output.contains("gate_pass_login_failures_total 1"));
        assert!(output.contains("gate_pass_search_misses_total 1"));
        assert!(output.contains("gate_pass_register_rows 7"));
    }

    #[test]
    fn test_clones_share_series() {
        let registry = MetricsRegistry::new().unwrap();
        registry.clone().record_search(true);
        let output = registry.encode().unwrap();
        assert!(output.contains("gate_pass_searches_total 1"));
        assert!(output.contains("gate_pass_search_misses_total 0"));
    }
}
