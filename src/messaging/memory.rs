//! In-process message broker
//!
//! Each topic is an append-only log. Every consumer group keeps one offset
//! per topic, starting at the beginning of the log, and members of a group
//! claim messages from that shared offset, so each message reaches exactly
//! one member per group.

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{wait_closed, Delivery, MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Default)]
struct TopicLog {
    messages: Vec<Delivery>,
    offsets: HashMap<String, usize>,
}

struct BrokerInner {
    topics: Mutex<HashMap<String, TopicLog>>,
    /// Bumped on every publish to wake waiting streams
    version: watch::Sender<u64>,
    closed: watch::Sender<bool>,
}

/// Cloneable handle to a shared in-memory broker
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                topics: Mutex::new(HashMap::new()),
                version: watch::channel(0).0,
                closed: watch::channel(false).0,
            }),
        }
    }

    /// Every message ever published to `topic`
    pub fn published(&self, topic: &str) -> Vec<Delivery> {
        self.inner
            .topics
            .lock()
            .get(topic)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }

    /// Messages on `topic` not yet claimed by `group`
    pub fn pending(&self, topic: &str, group: &str) -> usize {
        self.inner
            .topics
            .lock()
            .get(topic)
            .map(|log| log.messages.len() - log.offsets.get(group).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Close the broker; every stream's pending `next` returns `Closed`
    pub fn shutdown(&self) {
        self.inner.closed.send_replace(true);
    }

    fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Claim the next message for `group`, if any
    fn claim(&self, topic: &str, group: &str) -> Option<Delivery> {
        let mut topics = self.inner.topics.lock();
        let log = topics.get_mut(topic)?;
        let offset = log.offsets.entry(group.to_string()).or_insert(0);
        let delivery = log.messages.get(*offset)?.clone();
        *offset += 1;
        Some(delivery)
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageProducer for InMemoryBroker {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> MessagingResult<()> {
        if self.is_closed() {
            return Err(MessagingError::PublishFailed("broker is closed".to_string()));
        }

        self.inner
            .topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .messages
            .push(Delivery {
                topic: topic.to_string(),
                key: key.map(str::to_string),
                payload,
            });
        self.inner.version.send_modify(|v| *v += 1);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        !self.is_closed()
    }

    async fn close(&self) -> MessagingResult<()> {
        self.shutdown();
        Ok(())
    }
}

#[async_trait]
impl MessageConsumer for InMemoryBroker {
    async fn subscribe(&self, topic: &str, group: &str) -> MessagingResult<Box<dyn MessageStream>> {
        if self.is_closed() {
            return Err(MessagingError::Closed);
        }

        Ok(Box::new(InMemoryStream {
            broker: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            version: self.inner.version.subscribe(),
            closed: self.inner.closed.subscribe(),
        }))
    }

    async fn is_connected(&self) -> bool {
        !self.is_closed()
    }

    async fn close(&self) -> MessagingResult<()> {
        self.shutdown();
        Ok(())
    }
}

/// One group member's view of a topic
pub struct InMemoryStream {
    broker: InMemoryBroker,
    topic: String,
    group: String,
    version: watch::Receiver<u64>,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next(&mut self) -> MessagingResult<Option<Delivery>> {
        loop {
            if *self.closed.borrow() {
                return Err(MessagingError::Closed);
            }

            // Mark the current version seen before looking, so a publish
            // racing with the claim still wakes us
            self.version.borrow_and_update();
            if let Some(delivery) = self.broker.claim(&self.topic, &self.group) {
                return Ok(Some(delivery));
            }

            tokio::select! {
                _ = wait_closed(&mut self.closed) => return Err(MessagingError::Closed),
                changed = self.version.changed() => {
                    if changed.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn ack(&mut self) -> MessagingResult<()> {
        // Claiming already advanced the group offset
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_groups_share_offsets() {
        let broker = InMemoryBroker::new();
        for i in 0..3u8 {
            broker.publish("t", None, vec![i]).await.unwrap();
        }

        let mut a = broker.subscribe("t", "g1").await.unwrap();
        let mut b = broker.subscribe("t", "g1").await.unwrap();
        let mut other = broker.subscribe("t", "g2").await.unwrap();

        assert_eq!(a.next().await.unwrap().unwrap().payload, vec![0]);
        assert_eq!(b.next().await.unwrap().unwrap().payload, vec![1]);
        assert_eq!(a.next().await.unwrap().unwrap().payload, vec![2]);
        assert_eq!(other.next().await.unwrap().unwrap().payload, vec![0]);

        assert_eq!(broker.pending("t", "g1"), 0);
        assert_eq!(broker.pending("t", "g2"), 2);
        assert_eq!(broker.published("t").len(), 3);
    }

    #[tokio::test]
    async fn test_waiting_stream_wakes_on_publish() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.subscribe("t", "g").await.unwrap();

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish("t", Some("k"), b"x".to_vec()).await.unwrap();
        });

        let delivery = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(delivery.key.as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_pending_next() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.subscribe("t", "g").await.unwrap();

        let closer = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.shutdown();
        });

        let result = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap();
        assert!(matches!(result, Err(MessagingError::Closed)));
        assert!(broker.subscribe("t", "g").await.is_err());
    }
}
