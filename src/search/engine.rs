//! Search dispatch engine
//!
//! The engine owns a `tag -> handler` registry built at construction. A
//! search parses the expression, resolves one handler or all of them, runs
//! the handlers concurrently and merges their records once every handler has
//! returned. The first failing handler fails the whole search, and a
//! request-wide deadline aborts every handler still in flight.

use crate::search::biz::{Biz, IndexView};
use crate::search::config::SearchConfig;
use crate::search::entities::{
    CaseRecord, QuestionRecord, QuestionSetRecord, SkillRecord, StoreHandler,
};
use crate::search::error::{Result, SearchError};
use crate::search::expression::{QueryExpression, ALL_TARGET};
use crate::search::handler::EntityHandler;
use crate::search::metrics::SEARCH_METRICS;
use crate::search::query::{Page, DEFAULT_RESULT_WINDOW};
use crate::search::result::SearchResult;
use crate::search::store::DocumentStore;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Default request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fan-out search over registered entity handlers
pub struct SearchEngine {
    handlers: HashMap<Biz, Arc<dyn EntityHandler>>,
    timeout: Duration,
    default_page: Page,
    max_results: usize,
    result_window: usize,
}

impl SearchEngine {
    /// Engine with no handlers
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            default_page: Page::default(),
            max_results: SearchConfig::default().max_results,
            result_window: DEFAULT_RESULT_WINDOW,
        }
    }

    /// Engine searching all four entity indices of `view` in `store`
    pub fn for_store(store: Arc<dyn DocumentStore>, view: IndexView, config: &SearchConfig) -> Self {
        let highlight = config.enable_highlighting;
        Self::new()
            .with_page_size(config.page_size)
            .with_max_results(config.max_results)
            .with_result_window(config.max_result_window)
            .register(Arc::new(
                StoreHandler::<CaseRecord>::new(store.clone(), view).with_highlight(highlight),
            ))
            .register(Arc::new(
                StoreHandler::<QuestionRecord>::new(store.clone(), view).with_highlight(highlight),
            ))
            .register(Arc::new(
                StoreHandler::<SkillRecord>::new(store.clone(), view).with_highlight(highlight),
            ))
            .register(Arc::new(
                StoreHandler::<QuestionSetRecord>::new(store, view).with_highlight(highlight),
            ))
    }

    /// Add `handler` under its tag, replacing any previous one
    pub fn register(mut self, handler: Arc<dyn EntityHandler>) -> Self {
        self.handlers.insert(handler.biz(), handler);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.default_page.limit = size;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Reject pages whose `offset + limit` passes `window`
    pub fn with_result_window(mut self, window: usize) -> Self {
        self.result_window = window;
        self
    }

    /// Page used when the caller gives none
    pub fn default_page(&self) -> Page {
        self.default_page
    }

    /// Registered tags in registry order
    pub fn targets(&self) -> Vec<Biz> {
        Biz::all().filter(|b| self.handlers.contains_key(b)).collect()
    }

    /// Search with the default page
    pub async fn search(&self, expr: &str) -> Result<SearchResult> {
        self.search_page(expr, self.default_page).await
    }

    /// Search forwarding `page` to every handler
    pub async fn search_page(&self, expr: &str, page: Page) -> Result<SearchResult> {
        let start = Instant::now();

        let parsed = match QueryExpression::parse(expr) {
            Ok(parsed) => parsed,
            Err(e) => {
                SEARCH_METRICS.record_request("invalid", "parse", start.elapsed().as_secs_f64());
                return Err(e.into());
            }
        };

        let label = self.target_label(&parsed.target);
        let outcome = self.dispatch(&parsed, page.capped(self.max_results)).await;

        let status = match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        SEARCH_METRICS.record_request(label, status, start.elapsed().as_secs_f64());

        match &outcome {
            Ok(result) => debug!(search_target = %parsed.target, total = result.total(), "Search completed"),
            Err(e) if e.is_client_error() => debug!(search_target = %parsed.target, error = %e, "Search rejected"),
            Err(e) => warn!(search_target = %parsed.target, error = %e, "Search failed"),
        }

        outcome
    }

    /// Metric label for a target without echoing arbitrary input
    fn target_label(&self, target: &str) -> &'static str {
        if target == ALL_TARGET {
            return ALL_TARGET;
        }
        match Biz::from_str(target) {
            Ok(Biz::Case) => "case",
            Ok(Biz::Question) => "question",
            Ok(Biz::Skill) => "skill",
            Ok(Biz::QuestionSet) => "questionSet",
            Err(_) => "unknown",
        }
    }

    /// Handlers selected by `target`
    fn resolve(&self, target: &str) -> Result<Vec<Arc<dyn EntityHandler>>> {
        if target == ALL_TARGET {
            return Ok(Biz::all()
                .filter_map(|biz| self.handlers.get(&biz).cloned())
                .collect());
        }

        Biz::from_str(target)
            .ok()
            .and_then(|biz| self.handlers.get(&biz).cloned())
            .map(|handler| vec![handler])
            .ok_or_else(|| SearchError::UnknownTarget(target.to_string()))
    }

    fn check_window(&self, page: Page) -> Result<()> {
        match page.end() {
            Some(end) if end <= self.result_window => Ok(()),
            _ => Err(SearchError::ResultWindowExceeded {
                offset: page.offset,
                limit: page.limit,
                window: self.result_window,
            }),
        }
    }

    async fn dispatch(&self, expr: &QueryExpression, page: Page) -> Result<SearchResult> {
        self.check_window(page)?;
        let handlers = self.resolve(&expr.target)?;
        let keywords: Arc<str> = Arc::from(expr.keywords.as_str());

        tokio::time::timeout(self.timeout, fan_out(handlers, keywords, page))
            .await
            .map_err(|_| SearchError::Timeout(self.timeout.as_millis() as u64))?
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every handler concurrently and merge their records.
///
/// Returning early drops the join set, which aborts the remaining tasks.
async fn fan_out(
    handlers: Vec<Arc<dyn EntityHandler>>,
    keywords: Arc<str>,
    page: Page,
) -> Result<SearchResult> {
    let mut set = JoinSet::new();
    for handler in handlers {
        let keywords = keywords.clone();
        set.spawn(async move {
            let biz = handler.biz();
            handler
                .search(&keywords, page)
                .await
                .map_err(|e| SearchError::handler(biz, e))
        });
    }

    let mut result = SearchResult::default();
    while let Some(joined) = set.join_next().await {
        let hits = match joined {
            Ok(outcome) => outcome?,
            Err(e) => {
                return Err(SearchError::SearchFailed(format!(
                    "Handler task failed: {}",
                    e
                )))
            }
        };
        SEARCH_METRICS
            .handler_hits
            .with_label_values(&[hits.biz().as_ref()])
            .observe(hits.len() as f64);
        result.merge(hits);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::handler::EntityHits;
    use async_trait::async_trait;

    struct Empty(Biz);

    #[async_trait]
    impl EntityHandler for Empty {
        fn biz(&self) -> Biz {
            self.0
        }

        async fn search(&self, _keywords: &str, _page: Page) -> Result<EntityHits> {
            Ok(match self.0 {
                Biz::Case => EntityHits::Cases(Vec::new()),
                Biz::Question => EntityHits::Questions(Vec::new()),
                Biz::Skill => EntityHits::Skills(Vec::new()),
                Biz::QuestionSet => EntityHits::QuestionSets(Vec::new()),
            })
        }
    }

    #[test]
    fn test_resolve_targets() {
        let engine = SearchEngine::new()
            .register(Arc::new(Empty(Biz::Skill)))
            .register(Arc::new(Empty(Biz::Case)));

        assert_eq!(engine.targets(), vec![Biz::Case, Biz::Skill]);
        assert_eq!(engine.resolve("all").unwrap().len(), 2);
        assert_eq!(engine.resolve("skill").unwrap()[0].biz(), Biz::Skill);
        assert!(matches!(
            engine.resolve("question"),
            Err(SearchError::UnknownTarget(ref t)) if t == "question"
        ));
        assert!(matches!(
            engine.resolve("Skill"),
            Err(SearchError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_target_label_is_bounded() {
        let engine = SearchEngine::new();
        assert_eq!(engine.target_label("all"), "all");
        assert_eq!(engine.target_label("questionSet"), "questionSet");
        assert_eq!(engine.target_label("<script>"), "unknown");
    }

    #[tokio::test]
    async fn test_parse_error_propagates_unchanged() {
        let engine = SearchEngine::new().register(Arc::new(Empty(Biz::Case)));
        let err = engine.search("case:foo").await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidExpression(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_pages_past_the_window_are_rejected() {
        let engine = SearchEngine::new()
            .register(Arc::new(Empty(Biz::Case)))
            .with_result_window(100);

        assert!(engine.search_page("biz:case:x", Page::new(80, 20)).await.is_ok());
        for page in [Page::new(81, 20), Page::new(usize::MAX - 5, 20)] {
            let err = engine.search_page("biz:case:x", page).await.unwrap_err();
            assert!(matches!(err, SearchError::ResultWindowExceeded { window: 100, .. }));
        }
    }

    #[tokio::test]
    async fn test_all_with_no_handlers_is_empty() {
        let result = SearchEngine::new().search("biz:all:x").await.unwrap();
        assert!(result.is_empty());
    }
}
