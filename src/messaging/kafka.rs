//! Kafka message queue implementation

use crate::messaging::config::KafkaConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{wait_closed, Delivery, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{Message, Offset, TopicPartitionList};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("client.id", &config.client_id);

    if config.enable_sasl {
        if let (Some(mechanism), Some(username), Some(password)) = (
            &config.sasl_mechanism,
            &config.sasl_username,
            &config.sasl_password,
        ) {
            client_config
                .set("security.protocol", "SASL_PLAINTEXT")
                .set("sasl.mechanism", mechanism)
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
    }

    client_config
}

/// Kafka producer
pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    /// Create a new Kafka producer
    pub async fn new(config: KafkaConfig) -> MessagingResult<Self> {
        let producer: FutureProducer = client_config(&config)
            .set("compression.type", &config.compression_type)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("retries", config.retries.to_string())
            .create()
            .map_err(|e| MessagingError::ConnectionFailed(format!("Kafka producer creation failed: {}", e)))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> MessagingResult<()> {
        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(&payload[..]);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| MessagingError::PublishFailed(format!("Kafka publish failed: {}", e)))?;

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        // Kafka producer doesn't have an explicit connected state
        true
    }

    async fn close(&self) -> MessagingResult<()> {
        // Kafka producer flushes on drop
        Ok(())
    }
}

/// Kafka consumer; every subscription gets its own group member
pub struct KafkaConsumer {
    config: KafkaConfig,
    closed: watch::Sender<bool>,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer
    pub async fn new(config: KafkaConfig) -> MessagingResult<Self> {
        let (closed, _) = watch::channel(false);
        Ok(Self { config, closed })
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn subscribe(&self, topic: &str, group: &str) -> MessagingResult<Box<dyn MessageStream>> {
        if *self.closed.borrow() {
            return Err(MessagingError::Closed);
        }

        let consumer: StreamConsumer = client_config(&self.config)
            .set("group.id", group)
            .set("enable.auto.commit", self.config.enable_auto_commit.to_string())
            .set("auto.offset.reset", &self.config.auto_offset_reset)
            .set("session.timeout.ms", self.config.session_timeout_ms.to_string())
            .create()
            .map_err(|e| MessagingError::ConnectionFailed(format!("Kafka consumer creation failed: {}", e)))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| MessagingError::SubscribeFailed(format!("Kafka subscribe failed: {}", e)))?;

        debug!(topic, group, "Kafka consumer subscribed");

        Ok(Box::new(KafkaMessageStream {
            consumer,
            closed: self.closed.subscribe(),
            pending: None,
        }))
    }

    async fn is_connected(&self) -> bool {
        !*self.closed.borrow()
    }

    async fn close(&self) -> MessagingResult<()> {
        self.closed.send_replace(true);
        Ok(())
    }
}

/// Kafka message stream
pub struct KafkaMessageStream {
    consumer: StreamConsumer,
    closed: watch::Receiver<bool>,
    /// Topic, partition and offset of the last unacknowledged delivery
    pending: Option<(String, i32, i64)>,
}

#[async_trait]
impl MessageStream for KafkaMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<Delivery>> {
        let message = tokio::select! {
            _ = wait_closed(&mut self.closed) => return Err(MessagingError::Closed),
            received = self.consumer.recv() => received
                .map(|m| m.detach())
                .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka recv failed: {}", e)))?,
        };

        self.pending = Some((
            message.topic().to_string(),
            message.partition(),
            message.offset(),
        ));

        Ok(Some(Delivery {
            topic: message.topic().to_string(),
            key: message
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        let Some((topic, partition, offset)) = self.pending.take() else {
            return Ok(());
        };

        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&topic, partition, Offset::Offset(offset + 1))
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka commit failed: {}", e)))?;
        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka commit failed: {}", e)))?;
        Ok(())
    }
}
