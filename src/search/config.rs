//! Search configuration

use crate::search::error::{Result, SearchError};
use crate::search::query::{DEFAULT_PAGE_SIZE, DEFAULT_RESULT_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory holding one sub-directory per index
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Number of threads per index writer
    pub indexing_threads: usize,

    /// Commit and reload after every upsert
    pub realtime_indexing: bool,

    /// Commit interval in seconds when realtime indexing is off
    pub commit_interval_secs: u64,

    /// Results per entity when the caller gives no limit
    pub page_size: usize,

    /// Upper bound on results per entity
    pub max_results: usize,

    /// Deepest `offset + limit` a search may page to
    pub max_result_window: usize,

    /// Enable highlighting
    pub enable_highlighting: bool,

    /// Maximum characters per highlighted fragment
    pub highlight_max_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            indexing_threads: 1,
            realtime_indexing: true,
            commit_interval_secs: 5,
            page_size: DEFAULT_PAGE_SIZE,
            max_results: 100,
            max_result_window: DEFAULT_RESULT_WINDOW,
            enable_highlighting: true,
            highlight_max_chars: 150,
        }
    }
}

/// Tantivy refuses writer budgets below this per thread
const MIN_HEAP_PER_THREAD: usize = 15_000_000;

impl SearchConfig {
    /// Reject settings the store would fail on later
    pub fn validate(&self) -> Result<()> {
        if self.indexing_threads == 0 {
            return Err(SearchError::InvalidConfiguration(
                "indexing_threads must be at least 1".to_string(),
            ));
        }
        if self.writer_heap_size / self.indexing_threads < MIN_HEAP_PER_THREAD {
            return Err(SearchError::InvalidConfiguration(format!(
                "writer_heap_size must give each of the {} threads at least {} bytes",
                self.indexing_threads, MIN_HEAP_PER_THREAD
            )));
        }
        if !self.realtime_indexing && self.commit_interval_secs == 0 {
            return Err(SearchError::InvalidConfiguration(
                "commit_interval_secs must be at least 1 without realtime indexing".to_string(),
            ));
        }
        if self.max_results > self.max_result_window {
            return Err(SearchError::InvalidConfiguration(format!(
                "max_results must not exceed max_result_window ({})",
                self.max_result_window
            )));
        }
        if self.page_size == 0 || self.page_size > self.max_results {
            return Err(SearchError::InvalidConfiguration(format!(
                "page_size must be between 1 and max_results ({})",
                self.max_results
            )));
        }
        Ok(())
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn indexing_threads(mut self, threads: usize) -> Self {
        self.config.indexing_threads = threads;
        self
    }

    pub fn realtime_indexing(mut self, enabled: bool) -> Self {
        self.config.realtime_indexing = enabled;
        self
    }

    pub fn commit_interval_secs(mut self, secs: u64) -> Self {
        self.config.commit_interval_secs = secs;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn max_result_window(mut self, window: usize) -> Self {
        self.config.max_result_window = window;
        self
    }

    pub fn enable_highlighting(mut self, enabled: bool) -> Self {
        self.config.enable_highlighting = enabled;
        self
    }

    pub fn highlight_max_chars(mut self, max: usize) -> Self {
        self.config.highlight_max_chars = max;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
