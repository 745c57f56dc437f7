//! Sync consumer configuration

use crate::search::IndexView;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run a consumer for the published indices
    pub published: bool,

    /// Run a consumer for the admin indices
    pub admin: bool,

    /// Pause after a queue receive failure, in milliseconds
    pub retry_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            published: true,
            admin: true,
            retry_backoff_ms: 1000,
        }
    }
}

impl SyncConfig {
    /// Views with a consumer enabled
    pub fn views(&self) -> Vec<IndexView> {
        let mut views = Vec::with_capacity(2);
        if self.published {
            views.push(IndexView::Published);
        }
        if self.admin {
            views.push(IndexView::Admin);
        }
        views
    }
}
