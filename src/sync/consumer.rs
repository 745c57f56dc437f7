//! Long-running index sync consumer
//!
//! The consumer alternates between two states: `Listening`, blocked on the
//! next queue delivery, and `Processing`, applying it to the store. Every
//! delivery returns the loop to `Listening` whatever the outcome; malformed
//! events, unknown tags and failed upserts are logged and dropped, never
//! retried. [`IndexSyncConsumer::stop`] interrupts a pending receive and
//! waits for the loop to exit.

use crate::messaging::{wait_closed, Delivery, MessageConsumer, MessageStream};
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::metrics::SYNC_METRICS;
use crate::sync::processor::SyncProcessor;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of a sync consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerState {
    /// Not started
    Idle,
    /// Waiting for the next delivery
    Listening,
    /// Applying a delivery
    Processing,
    /// Loop exited
    Stopped,
}

/// Counters since the consumer started
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStats {
    pub received: u64,
    pub indexed: u64,
    pub dropped: u64,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// State shared between the handle and the running loop
struct Shared {
    processor: Arc<SyncProcessor>,
    view: String,
    state: watch::Sender<ConsumerState>,
    stats: Mutex<SyncStats>,
}

impl Shared {
    fn set_state(&self, state: ConsumerState) {
        self.state.send_replace(state);
    }

    /// Apply one delivery; failures are recorded and swallowed
    async fn handle(&self, delivery: &Delivery) {
        let start = Instant::now();
        let outcome = self.processor.apply(&delivery.payload).await;
        SYNC_METRICS
            .apply_latency
            .with_label_values(&[&self.view])
            .observe(start.elapsed().as_secs_f64());

        let mut stats = self.stats.lock();
        stats.received += 1;
        stats.last_event_at = Some(Utc::now());

        match outcome {
            Ok(applied) => {
                stats.indexed += 1;
                SYNC_METRICS
                    .events
                    .with_label_values(&[&self.view, "indexed"])
                    .inc();
                debug!(
                    biz = %applied.biz,
                    index = applied.index,
                    doc_id = %applied.doc_id,
                    "Indexed document"
                );
            }
            Err(e) => {
                stats.dropped += 1;
                stats.last_error = Some(e.to_string());
                SYNC_METRICS
                    .events
                    .with_label_values(&[&self.view, e.kind()])
                    .inc();
                match &e {
                    SyncError::Upsert { .. } => {
                        error!(topic = %delivery.topic, error = %e, "Dropping sync event")
                    }
                    _ => warn!(topic = %delivery.topic, error = %e, "Dropping sync event"),
                }
            }
        }
    }
}

/// Managed background consumer feeding one index view
pub struct IndexSyncConsumer {
    shared: Arc<Shared>,
    consumer: Arc<dyn MessageConsumer>,
    topic: String,
    group: String,
    retry_backoff: Duration,
    shutdown: watch::Sender<bool>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl IndexSyncConsumer {
    pub fn new(
        processor: Arc<SyncProcessor>,
        consumer: Arc<dyn MessageConsumer>,
        topic: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        let view = processor.routes().view().to_string();
        Self {
            shared: Arc::new(Shared {
                processor,
                view,
                state: watch::channel(ConsumerState::Idle).0,
                stats: Mutex::new(SyncStats::default()),
            }),
            consumer,
            topic: topic.into(),
            group: group.into(),
            retry_backoff: Duration::from_secs(1),
            shutdown: watch::channel(false).0,
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Pause after a receive failure before polling again
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> ConsumerState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions
    pub fn watch_state(&self) -> watch::Receiver<ConsumerState> {
        self.shared.state.subscribe()
    }

    pub fn stats(&self) -> SyncStats {
        self.shared.stats.lock().clone()
    }

    /// Subscribe and spawn the consume loop.
    ///
    /// Subscription errors are returned here rather than from the loop.
    pub async fn start(&self) -> SyncResult<()> {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(SyncError::AlreadyRunning);
        }

        let stream = self.consumer.subscribe(&self.topic, &self.group).await?;
        self.shutdown.send_replace(false);

        info!(
            topic = %self.topic,
            group = %self.group,
            view = %self.shared.view,
            "Index sync consumer started"
        );

        self.shared.set_state(ConsumerState::Listening);
        *handle = Some(tokio::spawn(consume_loop(
            stream,
            self.shared.clone(),
            self.shutdown.subscribe(),
            self.retry_backoff,
        )));
        Ok(())
    }

    /// Signal the loop to exit and wait for it.
    ///
    /// A pending receive is abandoned; an event already being applied
    /// finishes first.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Index sync consumer task failed");
            }
        }
        self.shared.set_state(ConsumerState::Stopped);
        info!(topic = %self.topic, "Index sync consumer stopped");
    }
}

async fn consume_loop(
    mut stream: Box<dyn MessageStream>,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
    retry_backoff: Duration,
) {
    loop {
        shared.set_state(ConsumerState::Listening);

        let next = tokio::select! {
            biased;
            _ = wait_closed(&mut shutdown) => break,
            next = stream.next() => next,
        };

        match next {
            Ok(Some(delivery)) => {
                shared.set_state(ConsumerState::Processing);
                shared.handle(&delivery).await;
                if let Err(e) = stream.ack().await {
                    warn!(error = %e, "Failed to acknowledge sync event");
                }
            }
            Ok(None) => {
                info!("Sync stream ended");
                break;
            }
            Err(e) if e.is_terminal() => {
                info!("Sync consumer closed");
                break;
            }
            Err(e) => {
                SYNC_METRICS
                    .receive_failures
                    .with_label_values(&[&shared.view])
                    .inc();
                warn!(error = %e, "Sync receive failed");
                tokio::select! {
                    _ = wait_closed(&mut shutdown) => break,
                    _ = tokio::time::sleep(retry_backoff) => {}
                }
            }
        }
    }

    shared.set_state(ConsumerState::Stopped);
}
