//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the peer.
//!
//! # Metrics
//!
//! - `chaincode_invocations_total` - Invocations by function and status
//! - `chaincode_invoke_duration_seconds` - Histogram of invocation latencies
//! - `chaincode_events_total` - Total number of events emitted
//! - `chaincode_access_denied_total` - Invocations refused by an access gate

use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Invocations by function and status
    pub invocations_total: IntCounterVec,

    /// Invocation duration histogram
    pub invoke_duration: HistogramVec,

    /// Total events emitted
    pub events_total: IntCounter,

    /// Invocations answered with 403
    pub access_denied_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let invocations_total = IntCounterVec::new(
            Opts::new(
                "chaincode_invocations_total",
                "Total number of chaincode invocations",
            ),
            &["function", "status"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let invoke_duration = HistogramVec::new(
            HistogramOpts::new(
                "chaincode_invoke_duration_seconds",
                "Histogram of invocation latencies",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.0]),
            &["function"],
        )?;
        registry.register(Box::new(invoke_duration.clone()))?;

        let events_total = IntCounter::new(
            "chaincode_events_total",
            "Total number of events emitted",
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let access_denied_total = IntCounter::new(
            "chaincode_access_denied_total",
            "Invocations refused by an access gate",
        )?;
        registry.register(Box::new(access_denied_total.clone()))?;

        Ok(Self {
            invocations_total,
            invoke_duration,
            events_total,
            access_denied_total,
            registry,
        })
    }

    /// Record a finished invocation
    pub fn record_invocation(&self, function: &str, status: u16, duration_seconds: f64) {
        self.invocations_total
            .with_label_values(&[function, &status.to_string()])
            .inc();
        if status == 403 {
            self.access_denied_total.inc();
        }
        self.invoke_histogram(function).observe(duration_seconds);
    }

    /// Record emitted events
    pub fn record_events(&self, count: usize) {
        self.events_total.inc_by(count as u64);
    }

    fn invoke_histogram(&self, function: &str) -> Histogram {
        self.invoke_duration.with_label_values(&[function])
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.events_total.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_events(3);
        assert_eq!(a.events_total.get(), 3);
        assert_eq!(b.events_total.get(), 0);
    }

    #[test]
    fn test_record_invocation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_invocation("CreateLoanApplication", 200, 0.002);
        metrics.record_invocation("CreateLoanApplication", 403, 0.001);
        metrics.record_invocation("CreateLoanApplication", 200, 0.003);

        let ok = metrics
            .invocations_total
            .with_label_values(&["CreateLoanApplication", "200"])
            .get();
        assert_eq!(ok, 2);
        assert_eq!(metrics.access_denied_total.get(), 1);
        assert_eq!(metrics.registry().gather().len(), 4);
    }
}
