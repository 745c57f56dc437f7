//! Common test utilities
//!
//! In-process stand-ins for the document store and the entity handlers,
//! plus helpers for waiting on background work.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use skill_search::search::{
    Biz, CaseRecord, DocumentStore, EntityHandler, EntityHits, EsVal, IndexSchema, Page,
    QuestionRecord, QuestionSetRecord, SearchError, SkillRecord, StoreHit, StoreQuery,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type StoreResult<T> = std::result::Result<T, SearchError>;

/// Document store keeping raw documents in memory.
///
/// Searches return every document of the index with a score of 1.0, so
/// tests using it exercise routing and decoding rather than ranking.
#[derive(Default)]
pub struct FakeStore {
    indices: Mutex<HashMap<String, HashMap<String, String>>>,
    creates: AtomicUsize,
    upserts: AtomicUsize,
    create_delay: Mutex<Duration>,
    fail_creates: AtomicBool,
    fail_upserts: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store where `create_index` takes `delay`, widening creation races
    pub fn with_create_delay(delay: Duration) -> Arc<Self> {
        let store = Self::default();
        *store.create_delay.lock() = delay;
        Arc::new(store)
    }

    pub fn add_index(&self, index: &str) {
        self.indices.lock().entry(index.to_string()).or_default();
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Stored document `doc_id` of `index`, parsed
    pub fn document(&self, index: &str, doc_id: &str) -> Option<serde_json::Value> {
        self.indices
            .lock()
            .get(index)
            .and_then(|docs| docs.get(doc_id))
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn len(&self, index: &str) -> usize {
        self.indices.lock().get(index).map(HashMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn index_exists(&self, index: &str) -> StoreResult<bool> {
        Ok(self.indices.lock().contains_key(index))
    }

    async fn create_index(&self, index: &str, _schema: &IndexSchema) -> StoreResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(SearchError::IndexInitFailed("store unavailable".to_string()));
        }

        let mut indices = self.indices.lock();
        if indices.contains_key(index) {
            return Err(SearchError::IndexInitFailed(format!(
                "index {index} already exists"
            )));
        }
        indices.insert(index.to_string(), HashMap::new());
        Ok(())
    }

    async fn index_document(&self, index: &str, doc_id: &str, document: &str) -> StoreResult<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(SearchError::IndexingFailed("store unavailable".to_string()));
        }
        let mut indices = self.indices.lock();
        let docs = indices
            .get_mut(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;
        docs.insert(doc_id.to_string(), document.to_string());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn search(&self, index: &str, query: &StoreQuery) -> StoreResult<Vec<StoreHit>> {
        let indices = self.indices.lock();
        let docs = indices
            .get(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let mut ids: Vec<&String> = docs.keys().collect();
        ids.sort();

        ids.into_iter()
            .skip(query.offset)
            .take(query.size)
            .map(|id| {
                let source = serde_json::from_str(&docs[id]).map_err(|e| {
                    SearchError::InvalidDocument {
                        id: id.clone(),
                        message: e.to_string(),
                    }
                })?;
                Ok::<_, SearchError>(StoreHit {
                    id: id.clone(),
                    score: 1.0,
                    source,
                    highlights: HashMap::new(),
                })
            })
            .collect()
    }

    async fn count(&self, index: &str) -> StoreResult<u64> {
        Ok(self.len(index) as u64)
    }
}

/// What a [`MockHandler`] does when called
#[derive(Debug, Clone, Copy)]
pub enum MockOutcome {
    /// Return this many records
    Hits(usize),
    /// Fail with a store error
    Fail,
}

/// Entity handler with scripted latency and outcome
pub struct MockHandler {
    biz: Biz,
    delay: Duration,
    outcome: MockOutcome,
    calls: AtomicUsize,
    completed: AtomicUsize,
    last_call: Mutex<Option<(String, Page)>>,
}

impl MockHandler {
    pub fn new(biz: Biz, outcome: MockOutcome) -> Arc<Self> {
        Self::delayed(biz, outcome, Duration::ZERO)
    }

    pub fn delayed(biz: Biz, outcome: MockOutcome, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            biz,
            delay,
            outcome,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion rather than being aborted
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, Page)> {
        self.last_call.lock().clone()
    }
}

#[async_trait]
impl EntityHandler for MockHandler {
    fn biz(&self) -> Biz {
        self.biz
    }

    async fn search(&self, keywords: &str, page: Page) -> StoreResult<EntityHits> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock() = Some((keywords.to_string(), page));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        match self.outcome {
            MockOutcome::Hits(n) => Ok(hits(self.biz, n)),
            MockOutcome::Fail => Err(SearchError::SearchFailed(format!("{} store down", self.biz))),
        }
    }
}

/// `n` records of type `biz` with ids `0..n`
pub fn hits(biz: Biz, n: usize) -> EntityHits {
    let ids = 0..n as i64;
    match biz {
        Biz::Case => EntityHits::Cases(
            ids.map(|id| CaseRecord {
                id,
                title: EsVal::plain(format!("case {id}")),
                ..Default::default()
            })
            .collect(),
        ),
        Biz::Question => EntityHits::Questions(
            ids.map(|id| QuestionRecord {
                id,
                title: EsVal::plain(format!("question {id}")),
                ..Default::default()
            })
            .collect(),
        ),
        Biz::Skill => EntityHits::Skills(
            ids.map(|id| SkillRecord {
                id,
                name: EsVal::plain(format!("skill {id}")),
                ..Default::default()
            })
            .collect(),
        ),
        Biz::QuestionSet => EntityHits::QuestionSets(
            ids.map(|id| QuestionSetRecord {
                id,
                title: EsVal::plain(format!("set {id}")),
                ..Default::default()
            })
            .collect(),
        ),
    }
}

/// Poll `check` until it holds, failing the test after five seconds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
