//! Index synchronization
//!
//! Entity services publish a [`SyncEvent`](crate::messaging::SyncEvent)
//! whenever a searchable record changes. One [`IndexSyncConsumer`] per
//! index view drains its topic and upserts each carried document into the
//! index its business tag routes to.
//!
//! ```text
//! producer ──► sync_data_to_search ───────► consumer ──► case_index, ...
//!          ──► sync_data_to_admin_search ─► consumer ──► case_admin_index, ...
//! ```
//!
//! Delivery is at-least-once. Upserts are keyed by the event's `bizID`,
//! so redelivered events converge on the same document.

pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod processor;
pub mod publisher;
pub mod routing;

pub use config::SyncConfig;
pub use consumer::{ConsumerState, IndexSyncConsumer, SyncStats};
pub use error::{SyncError, SyncResult};
pub use metrics::SYNC_METRICS;
pub use processor::{Applied, SyncProcessor};
pub use publisher::SyncEventPublisher;
pub use routing::IndexRoutes;
