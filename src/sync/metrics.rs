//! Prometheus metrics for index synchronization

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

pub struct SyncMetrics {
    /// Events handled by view and outcome
    pub events: CounterVec,

    /// Time spent applying one event
    pub apply_latency: HistogramVec,

    /// Queue receive failures
    pub receive_failures: CounterVec,
}

lazy_static! {
    pub static ref SYNC_METRICS: SyncMetrics = SyncMetrics {
        events: register_counter_vec!(
            "sync_events_total",
            "Sync events handled",
            &["view", "outcome"]
        )
        .unwrap(),

        apply_latency: register_histogram_vec!(
            "sync_apply_latency_seconds",
            "Time to apply one sync event in seconds",
            &["view"]
        )
        .unwrap(),

        receive_failures: register_counter_vec!(
            "sync_receive_failures_total",
            "Queue receive failures",
            &["view"]
        )
        .unwrap(),
    };
}
