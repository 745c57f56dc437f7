//! NATS message queue implementation

use crate::messaging::config::NatsConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{wait_closed, Delivery, MessageConsumer, MessageProducer, MessageStream};
use async_nats::{Client, ServerAddr};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;

async fn connect(config: &NatsConfig) -> MessagingResult<Client> {
    let servers = config
        .servers
        .iter()
        .map(|s| s.parse::<ServerAddr>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MessagingError::ConfigurationError(format!("Invalid NATS server: {}", e)))?;

    async_nats::ConnectOptions::new()
        .name(&config.connection_name)
        .connect(servers.as_slice())
        .await
        .map_err(|e| MessagingError::ConnectionFailed(format!("NATS connection failed: {}", e)))
}

/// NATS producer
pub struct NatsProducer {
    client: Client,
}

impl NatsProducer {
    /// Create a new NATS producer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        Ok(Self {
            client: connect(&config).await?,
        })
    }
}

#[async_trait]
impl MessageProducer for NatsProducer {
    /// Subjects have no partitions, so `key` is ignored
    async fn publish(&self, topic: &str, _key: Option<&str>, payload: Vec<u8>) -> MessagingResult<()> {
        self.client
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS publish failed: {}", e)))?;

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    async fn close(&self) -> MessagingResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("NATS flush failed: {}", e)))
    }
}

/// NATS consumer; groups map onto queue groups
pub struct NatsConsumer {
    client: Client,
    closed: watch::Sender<bool>,
}

impl NatsConsumer {
    /// Create a new NATS consumer
    pub async fn new(config: NatsConfig) -> MessagingResult<Self> {
        let (closed, _) = watch::channel(false);
        Ok(Self {
            client: connect(&config).await?,
            closed,
        })
    }
}

#[async_trait]
impl MessageConsumer for NatsConsumer {
    async fn subscribe(&self, topic: &str, group: &str) -> MessagingResult<Box<dyn MessageStream>> {
        if *self.closed.borrow() {
            return Err(MessagingError::Closed);
        }

        let subscriber = self
            .client
            .queue_subscribe(topic.to_string(), group.to_string())
            .await
            .map_err(|e| MessagingError::SubscribeFailed(format!("NATS subscribe failed: {}", e)))?;

        Ok(Box::new(NatsMessageStream {
            subscriber,
            closed: self.closed.subscribe(),
        }))
    }

    async fn is_connected(&self) -> bool {
        !*self.closed.borrow()
            && self.client.connection_state() == async_nats::connection::State::Connected
    }

    async fn close(&self) -> MessagingResult<()> {
        self.closed.send_replace(true);
        Ok(())
    }
}

/// NATS message stream
pub struct NatsMessageStream {
    subscriber: async_nats::Subscriber,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl MessageStream for NatsMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<Delivery>> {
        let message = tokio::select! {
            _ = wait_closed(&mut self.closed) => {
                let _ = self.subscriber.unsubscribe().await;
                return Err(MessagingError::Closed);
            }
            message = self.subscriber.next() => message,
        };

        Ok(message.map(|msg| Delivery {
            topic: msg.subject.to_string(),
            key: None,
            payload: msg.payload.to_vec(),
        }))
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        // Core NATS has no acknowledgements
        Ok(())
    }
}
