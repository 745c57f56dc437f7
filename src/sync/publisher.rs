//! Producer side of index synchronization

use crate::messaging::{MessageProducer, MessagingConfig, MessagingError, SyncEvent};
use crate::search::{Biz, IndexView};
use crate::sync::error::SyncResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Publishes entity changes for the sync consumer of one view.
///
/// Events are keyed by document id, so changes to one document stay
/// ordered on partitioned backends.
#[derive(Clone)]
pub struct SyncEventPublisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl SyncEventPublisher {
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    /// Publisher on the configured topic for `view`
    pub fn for_view(
        producer: Arc<dyn MessageProducer>,
        config: &MessagingConfig,
        view: IndexView,
    ) -> Self {
        Self::new(producer, config.topic_for(view))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish `document` as the current version of `biz`/`biz_id`
    pub async fn publish<T: Serialize>(
        &self,
        biz: Biz,
        biz_id: impl ToString,
        document: &T,
    ) -> SyncResult<()> {
        let event = SyncEvent::from_document(biz, biz_id, document).map_err(MessagingError::from)?;
        self.publish_event(&event).await
    }

    pub async fn publish_event(&self, event: &SyncEvent) -> SyncResult<()> {
        let payload = event.to_bytes().map_err(MessagingError::from)?;
        self.producer
            .publish(&self.topic, Some(&event.biz_id), payload)
            .await?;
        debug!(topic = %self.topic, biz = %event.biz, biz_id = %event.biz_id, "Published sync event");
        Ok(())
    }
}
