// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::time::Instant;

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the contract service
// ============================================================================
//
// - API requests by operation and response status, with latency
// - SKU mapping rows written by create/update
// - Catalog lookups by outcome
// - Catalog circuit breakers (one per shop): how many are open, transitions
//
// Scraped from /metrics on the metrics port.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub api_requests: IntCounterVec,
    pub api_request_duration: HistogramVec,

    pub sku_mappings_written: IntCounter,

    pub catalog_requests: IntCounterVec,
    pub open_circuit_breakers: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let api_requests = IntCounterVec::new(
            Opts::new("api_requests_total", "API requests by operation and status"),
            &["operation", "status"],
        )?;
        registry.register(Box::new(api_requests.clone()))?;

        let api_request_duration = HistogramVec::new(
            HistogramOpts::new("api_request_duration_seconds", "API request duration")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["operation"],
        )?;
        registry.register(Box::new(api_request_duration.clone()))?;

        let sku_mappings_written = IntCounter::new(
            "sku_mappings_written_total",
            "SKU mapping rows written by contract create/update",
        )?;
        registry.register(Box::new(sku_mappings_written.clone()))?;

        let catalog_requests = IntCounterVec::new(
            Opts::new("catalog_requests_total", "Catalog product lookups by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(catalog_requests.clone()))?;

        let open_circuit_breakers = IntGauge::new(
            "catalog_open_circuit_breakers",
            "Shops whose catalog circuit breaker is open",
        )?;
        registry.register(Box::new(open_circuit_breakers.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        Ok(Self {
            registry,
            api_requests,
            api_request_duration,
            sku_mappings_written,
            catalog_requests,
            open_circuit_breakers,
            circuit_breaker_transitions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Starts timing an API operation; finish it with the response status.
    pub fn track(&self, operation: &'static str) -> RequestTimer<'_> {
        RequestTimer {
            metrics: self,
            operation,
            started: Instant::now(),
        }
    }

    pub fn record_request(&self, operation: &str, status: u16, duration_secs: f64) {
        self.api_requests
            .with_label_values(&[operation, &status.to_string()])
            .inc();
        self.api_request_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_mappings_written(&self, count: usize) {
        self.sku_mappings_written.inc_by(count as u64);
    }

    pub fn record_catalog_request(&self, outcome: &str) {
        self.catalog_requests.with_label_values(&[outcome]).inc();
    }

    pub fn set_open_circuit_breakers(&self, count: i64) {
        self.open_circuit_breakers.set(count);
    }

    pub fn record_circuit_breaker_transition(&self, from_state: &str, to_state: &str) {
        self.circuit_breaker_transitions
            .with_label_values(&[from_state, to_state])
            .inc();
    }
}

pub struct RequestTimer<'a> {
    metrics: &'a Metrics,
    operation: &'static str,
    started: Instant,
}

impl RequestTimer<'_> {
    pub fn finish(self, status: u16) {
        self.metrics.record_request(
            self.operation,
            status,
            self.started.elapsed().as_secs_f64(),
        );
    }
}
