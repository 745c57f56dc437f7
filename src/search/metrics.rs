//! Prometheus metrics for search

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec,
};

/// Search metrics
pub struct SearchMetrics {
    /// Search requests by target and outcome
    pub requests: CounterVec,

    /// End-to-end search latency
    pub latency: HistogramVec,

    /// Records returned per entity handler
    pub handler_hits: HistogramVec,

    /// Index bootstrap outcomes
    pub bootstrap: CounterVec,
}

lazy_static! {
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics {
        requests: register_counter_vec!(
            "search_requests_total",
            "Total number of search requests",
            &["target", "outcome"]
        )
        .unwrap(),

        latency: register_histogram_vec!(
            "search_latency_seconds",
            "Search latency in seconds",
            &["target"]
        )
        .unwrap(),

        handler_hits: register_histogram_vec!(
            "search_handler_hits",
            "Records returned by one entity handler",
            &["biz"],
            vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
        )
        .unwrap(),

        bootstrap: register_counter_vec!(
            "search_index_bootstrap_total",
            "Index bootstrap checks by outcome",
            &["index", "outcome"]
        )
        .unwrap(),
    };
}

impl SearchMetrics {
    pub fn record_request(&self, target: &str, outcome: &str, seconds: f64) {
        self.requests.with_label_values(&[target, outcome]).inc();
        self.latency.with_label_values(&[target]).observe(seconds);
    }
}
