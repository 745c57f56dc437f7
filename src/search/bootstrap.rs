//! Startup index creation
//!
//! [`IndexBootstrap::ensure_index`] creates a missing index from its embedded
//! schema and is a no-op for an existing one. Each index name has its own
//! run-once gate, so concurrent callers for the same name share a single
//! check-and-create round trip to the store. Existing indices are never
//! migrated.

use crate::search::biz::{Biz, IndexView};
use crate::search::entities::schema_for;
use crate::search::error::{Result, SearchError};
use crate::search::metrics::SEARCH_METRICS;
use crate::search::store::{DocumentStore, IndexSchema};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Idempotent index creation guarded per index name
pub struct IndexBootstrap {
    store: Arc<dyn DocumentStore>,
    gates: DashMap<String, Arc<OnceCell<()>>>,
}

impl IndexBootstrap {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            gates: DashMap::new(),
        }
    }

    /// Create `name` from `schema` unless it already exists.
    ///
    /// A failed attempt leaves the gate open so a later call may retry.
    pub async fn ensure_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        let gate = self
            .gates
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        gate.get_or_try_init(|| async {
            let outcome = if self.store.index_exists(name).await? {
                "exists"
            } else {
                self.store.create_index(name, schema).await?;
                info!(index = name, "Created search index");
                "created"
            };
            SEARCH_METRICS
                .bootstrap
                .with_label_values(&[name, outcome])
                .inc();
            Ok::<_, SearchError>(())
        })
        .await
        .map(|_| ())
        .inspect_err(|_| {
            SEARCH_METRICS
                .bootstrap
                .with_label_values(&[name, "failed"])
                .inc();
        })
    }

    /// Ensure every entity index of `view`
    pub async fn ensure_view(&self, view: IndexView) -> Result<()> {
        for biz in Biz::all() {
            let schema = schema_for(biz)?;
            self.ensure_index(biz.index_name(view), &schema).await?;
        }
        Ok(())
    }
}
