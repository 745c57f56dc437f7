//! Message queue plumbing for index synchronization
//!
//! CRUD services publish [`SyncEvent`]s; the [`sync`](crate::sync) consumer
//! reads them back through the same abstraction.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │      MessageProducer / MessageConsumer   │
//! │      subscribe(topic, group) -> stream   │
//! └──────────────────────────────────────────┘
//!        │               │               │
//!        ▼               ▼               ▼
//!  ┌───────────┐   ┌───────────┐   ┌───────────┐
//!  │   Kafka   │   │   NATS    │   │ In-memory │
//!  │  groups   │   │  queue    │   │  per-group│
//!  │  commits  │   │  groups   │   │  offsets  │
//!  └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! Closing a consumer makes every pending and future `next` on its streams
//! return [`MessagingError::Closed`], which consumers treat as the end of the
//! stream rather than a transient failure.

mod config;
mod error;
mod events;
mod kafka;
mod memory;
mod metrics;
mod nats;
mod service;
mod traits;

pub use config::{KafkaConfig, MessagingBackend, MessagingConfig, NatsConfig};
pub use error::{MessagingError, MessagingResult};
pub use events::{SyncEvent, ADMIN_SYNC_TOPIC, SYNC_CONSUMER_GROUP, SYNC_TOPIC};
pub use kafka::{KafkaConsumer, KafkaProducer};
pub use memory::InMemoryBroker;
pub use metrics::{init_messaging_metrics, MESSAGING_METRICS};
pub use nats::{NatsConsumer, NatsProducer};
pub use service::MessagingService;
pub use traits::{Delivery, MessageConsumer, MessageProducer, MessageStream};

pub(crate) use traits::wait_closed;
