//! Production metrics with Prometheus
//!
//! Exposes key operational metrics for monitoring and alerting:
//! - Request rates and latencies
//! - Analysis outcomes and duration
//! - Per-test computation faults
//!
//! Labels stay low-cardinality: method/endpoint/status for HTTP, a fixed
//! result label for analyses, and the five test names for faults.

use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Request Metrics
    // ============================================================================

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "splitstat_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Total HTTP requests
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("splitstat_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"]
    ).unwrap();

    // ============================================================================
    // Analysis Metrics
    // ============================================================================

    /// Analyses by outcome ("assembled" or "rejected")
    pub static ref ANALYSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("splitstat_analyses_total", "Total analysis requests by outcome"),
        &["result"]
    ).unwrap();

    /// End-to-end analysis duration. Barnard's nuisance scan dominates,
    /// so the buckets reach further than the HTTP histogram's.
    pub static ref ANALYSIS_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "splitstat_analysis_duration_seconds",
            "Analysis duration in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0])
    ).unwrap();

    /// Statistical tests that faulted and were reported undefined
    pub static ref TEST_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("splitstat_test_failures_total", "Tests degraded to an undefined result"),
        &["test"]
    ).unwrap();
}

/// Register all metrics with the global registry
pub fn register_metrics() -> Result<(), prometheus::Error> {
    METRICS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(ANALYSES_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(ANALYSIS_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(TEST_FAILURES_TOTAL.clone()))?;

    Ok(())
}

/// Helper to time operations with histogram (RAII pattern)
/// Usage: let _timer = Timer::new(SOME_HISTOGRAM.clone());
pub struct Timer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl Timer {
    /// Create timer that records duration to histogram on drop
    pub fn new(histogram: Histogram) -> Self {
        Self {
            histogram,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
