//! Applying one sync event to the store

use crate::messaging::SyncEvent;
use crate::search::{Biz, DocumentStore};
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::routing::IndexRoutes;
use std::sync::Arc;

/// What an applied event touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub biz: Biz,
    pub index: &'static str,
    pub doc_id: String,
}

/// Routes events to their index and upserts the carried document.
///
/// Upserts are keyed by the event's id, so applying an event again
/// leaves the store unchanged.
pub struct SyncProcessor {
    store: Arc<dyn DocumentStore>,
    routes: IndexRoutes,
}

impl SyncProcessor {
    pub fn new(store: Arc<dyn DocumentStore>, routes: IndexRoutes) -> Self {
        Self { store, routes }
    }

    pub fn routes(&self) -> IndexRoutes {
        self.routes
    }

    /// Decode and apply a raw queue payload
    pub async fn apply(&self, payload: &[u8]) -> SyncResult<Applied> {
        let event = SyncEvent::decode(payload).map_err(|e| SyncError::Decode(e.to_string()))?;
        self.apply_event(&event).await
    }

    pub async fn apply_event(&self, event: &SyncEvent) -> SyncResult<Applied> {
        let (biz, index) = self.routes.resolve(&event.biz)?;
        if event.biz_id.trim().is_empty() {
            return Err(SyncError::InvalidEvent(format!("{biz} event without bizID")));
        }

        self.store
            .index_document(index, &event.biz_id, &event.data)
            .await
            .map_err(|source| SyncError::Upsert {
                index: index.to_string(),
                source,
            })?;

        Ok(Applied {
            biz,
            index,
            doc_id: event.biz_id.clone(),
        })
    }
}
