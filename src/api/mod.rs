pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::{IndexView, SearchEngine};
use crate::sync::IndexSyncConsumer;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub published: Arc<SearchEngine>,
    pub admin: Arc<SearchEngine>,
    pub consumers: Vec<Arc<IndexSyncConsumer>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(published: Arc<SearchEngine>, admin: Arc<SearchEngine>) -> Self {
        Self {
            published,
            admin,
            consumers: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// Expose sync consumer status
    pub fn with_consumers(mut self, consumers: Vec<Arc<IndexSyncConsumer>>) -> Self {
        self.consumers = consumers;
        self
    }

    pub fn engine(&self, view: IndexView) -> &SearchEngine {
        match view {
            IndexView::Published => &self.published,
            IndexView::Admin => &self.admin,
        }
    }
}
