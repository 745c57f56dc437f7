//! Prometheus metrics for messaging

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Messaging metrics
pub struct MessagingMetrics {
    /// Messages published counter
    pub messages_published: CounterVec,

    /// Message publish failures
    pub publish_failures: CounterVec,

    /// Message publish latency
    pub publish_latency: HistogramVec,

    /// Message size histogram
    pub message_size: HistogramVec,
}

lazy_static! {
    pub static ref MESSAGING_METRICS: MessagingMetrics = MessagingMetrics {
        messages_published: register_counter_vec!(
            "messaging_messages_published_total",
            "Total number of messages published",
            &["topic", "backend"]
        )
        .unwrap(),

        publish_failures: register_counter_vec!(
            "messaging_publish_failures_total",
            "Total number of publish failures",
            &["topic", "backend"]
        )
        .unwrap(),

        publish_latency: register_histogram_vec!(
            "messaging_publish_latency_seconds",
            "Message publish latency in seconds",
            &["topic", "backend"]
        )
        .unwrap(),

        message_size: register_histogram_vec!(
            "messaging_message_size_bytes",
            "Message size in bytes",
            &["topic", "backend"],
            prometheus::exponential_buckets(256.0, 4.0, 8).unwrap()
        )
        .unwrap(),
    };
}

/// Initialize messaging metrics
pub fn init_messaging_metrics() {
    lazy_static::initialize(&MESSAGING_METRICS);
}
