//! Messaging configuration

use crate::messaging::events::{ADMIN_SYNC_TOPIC, SYNC_CONSUMER_GROUP, SYNC_TOPIC};
use crate::search::IndexView;
use serde::{Deserialize, Serialize};

/// Messaging backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessagingBackend {
    /// Kafka - distributed event streaming platform
    Kafka,
    /// NATS - lightweight messaging with queue groups
    Nats,
    /// In-process broker, for tests and single-node setups
    InMemory,
}

/// NATS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,

    /// Connection name
    pub connection_name: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            connection_name: "skill-search".to_string(),
        }
    }
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Kafka bootstrap servers
    pub bootstrap_servers: String,

    /// Client ID
    pub client_id: String,

    /// Commit offsets in the background instead of on ack
    pub enable_auto_commit: bool,

    /// Where a new consumer group starts (earliest, latest)
    pub auto_offset_reset: String,

    /// Session timeout in milliseconds
    pub session_timeout_ms: u64,

    /// Enable SASL authentication
    pub enable_sasl: bool,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password
    pub sasl_password: Option<String>,

    /// Compression type (none, gzip, snappy, lz4)
    pub compression_type: String,

    /// Message timeout in milliseconds
    pub message_timeout_ms: u64,

    /// Number of retries
    pub retries: u32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "skill-search".to_string(),
            enable_auto_commit: false,
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: 30000,
            enable_sasl: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            compression_type: "snappy".to_string(),
            message_timeout_ms: 30000,
            retries: 3,
        }
    }
}

/// Main messaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Backend to use
    pub backend: MessagingBackend,

    /// NATS configuration
    pub nats: NatsConfig,

    /// Kafka configuration
    pub kafka: KafkaConfig,

    /// Topic feeding the published indices
    pub sync_topic: String,

    /// Topic feeding the admin indices
    pub admin_sync_topic: String,

    /// Consumer group shared by every sync consumer instance
    pub consumer_group: String,

    /// Enable metrics
    pub enable_metrics: bool,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            backend: MessagingBackend::Kafka,
            nats: NatsConfig::default(),
            kafka: KafkaConfig::default(),
            sync_topic: SYNC_TOPIC.to_string(),
            admin_sync_topic: ADMIN_SYNC_TOPIC.to_string(),
            consumer_group: SYNC_CONSUMER_GROUP.to_string(),
            enable_metrics: true,
        }
    }
}

impl MessagingConfig {
    /// Sync topic for an index view
    pub fn topic_for(&self, view: IndexView) -> &str {
        match view {
            IndexView::Published => &self.sync_topic,
            IndexView::Admin => &self.admin_sync_topic,
        }
    }
}
