//! Main messaging service

use crate::messaging::config::{MessagingBackend, MessagingConfig};
use crate::messaging::error::MessagingResult;
use crate::messaging::kafka::{KafkaConsumer, KafkaProducer};
use crate::messaging::memory::InMemoryBroker;
use crate::messaging::metrics::MESSAGING_METRICS;
use crate::messaging::nats::{NatsConsumer, NatsProducer};
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Producer and consumer for the configured backend.
///
/// The service is itself a [`MessageProducer`] and [`MessageConsumer`],
/// delegating to the backend and recording publish metrics.
pub struct MessagingService {
    config: MessagingConfig,
    producer: Arc<dyn MessageProducer>,
    consumer: Arc<dyn MessageConsumer>,
}

impl MessagingService {
    /// Connect to the configured backend
    pub async fn new(config: MessagingConfig) -> MessagingResult<Self> {
        let (producer, consumer): (Arc<dyn MessageProducer>, Arc<dyn MessageConsumer>) =
            match config.backend {
                MessagingBackend::Kafka => (
                    Arc::new(KafkaProducer::new(config.kafka.clone()).await?),
                    Arc::new(KafkaConsumer::new(config.kafka.clone()).await?),
                ),
                MessagingBackend::Nats => (
                    Arc::new(NatsProducer::new(config.nats.clone()).await?),
                    Arc::new(NatsConsumer::new(config.nats.clone()).await?),
                ),
                MessagingBackend::InMemory => {
                    let broker = InMemoryBroker::new();
                    (Arc::new(broker.clone()), Arc::new(broker))
                }
            };

        if config.enable_metrics {
            crate::messaging::metrics::init_messaging_metrics();
        }

        info!(backend = %config.backend, "Messaging service ready");

        Ok(Self {
            config,
            producer,
            consumer,
        })
    }

    /// Service on an existing in-memory broker
    pub fn in_memory(config: MessagingConfig, broker: InMemoryBroker) -> Self {
        Self {
            config: MessagingConfig {
                backend: MessagingBackend::InMemory,
                ..config
            },
            producer: Arc::new(broker.clone()),
            consumer: Arc::new(broker),
        }
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    pub fn backend(&self) -> MessagingBackend {
        self.config.backend
    }
}

#[async_trait]
impl MessageProducer for MessagingService {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> MessagingResult<()> {
        let size = payload.len() as f64;
        let start = Instant::now();
        let result = self.producer.publish(topic, key, payload).await;

        if self.config.enable_metrics {
            let backend = self.config.backend.to_string();
            let labels = [topic, backend.as_str()];
            match &result {
                Ok(()) => {
                    MESSAGING_METRICS.messages_published.with_label_values(&labels).inc();
                    MESSAGING_METRICS
                        .publish_latency
                        .with_label_values(&labels)
                        .observe(start.elapsed().as_secs_f64());
                    MESSAGING_METRICS.message_size.with_label_values(&labels).observe(size);
                }
                Err(_) => MESSAGING_METRICS.publish_failures.with_label_values(&labels).inc(),
            }
        }

        result
    }

    async fn is_connected(&self) -> bool {
        self.producer.is_connected().await
    }

    async fn close(&self) -> MessagingResult<()> {
        self.producer.close().await
    }
}

#[async_trait]
impl MessageConsumer for MessagingService {
    async fn subscribe(&self, topic: &str, group: &str) -> MessagingResult<Box<dyn MessageStream>> {
        self.consumer.subscribe(topic, group).await
    }

    async fn is_connected(&self) -> bool {
        self.consumer.is_connected().await
    }

    async fn close(&self) -> MessagingResult<()> {
        self.consumer.close().await
    }
}
