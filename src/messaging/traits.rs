//! Messaging trait abstractions

use crate::messaging::error::{MessagingError, MessagingResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

/// A message received from a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl Delivery {
    /// Decode the JSON payload
    pub fn decode<T: DeserializeOwned>(&self) -> MessagingResult<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| MessagingError::DeserializationError(e.to_string()))
    }
}

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish `payload` to `topic`; `key` selects the partition where supported
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> MessagingResult<()>;

    /// Check if the producer is connected
    async fn is_connected(&self) -> bool;

    /// Close the producer connection
    async fn close(&self) -> MessagingResult<()>;
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe to `topic` as a member of `group`.
    ///
    /// Members of one group share the topic's messages; each group sees
    /// every message.
    async fn subscribe(&self, topic: &str, group: &str) -> MessagingResult<Box<dyn MessageStream>>;

    /// Check if the consumer is connected
    async fn is_connected(&self) -> bool;

    /// Close the consumer; pending and future `next` calls on its streams
    /// return [`MessagingError::Closed`]
    async fn close(&self) -> MessagingResult<()>;
}

/// Message stream trait for consuming messages
#[async_trait]
pub trait MessageStream: Send {
    /// Wait for the next delivery; `Ok(None)` when the stream has ended
    async fn next(&mut self) -> MessagingResult<Option<Delivery>>;

    /// Acknowledge the last delivery
    async fn ack(&mut self) -> MessagingResult<()>;
}

/// Resolves once `closed` flips to true or its sender is gone
pub(crate) async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}
