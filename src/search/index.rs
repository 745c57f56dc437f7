//! Tantivy-backed document store
//!
//! Every logical index lives in its own directory under
//! [`SearchConfig::index_path`]. Alongside the tantivy files each directory
//! carries the [`IndexSchema`] it was created from, so documents can be
//! mapped from raw JSON after a restart. The raw document is stored verbatim
//! in `_source` and returned on hits; `_id` holds the upsert key.
//!
//! With `realtime_indexing` off, upserts are buffered in the writer and made
//! searchable by an [`IndexCommitter`] every `commit_interval_secs`.

use crate::search::config::SearchConfig;
use crate::search::error::{Result, SearchError};
use crate::search::store::{
    Clause, DocumentStore, FieldKind, Filter, IndexSchema, StoreHit, StoreQuery,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, ConstScoreQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, Value, FAST, INDEXED, STORED, STRING, TEXT,
};
use tantivy::snippet::SnippetGenerator;
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const ID_FIELD: &str = "_id";
const SOURCE_FIELD: &str = "_source";
const SCHEMA_FILE: &str = "index_schema.json";

/// One open tantivy index
struct ManagedIndex {
    index: Index,
    definition: IndexSchema,
    fields: HashMap<String, Field>,
    id_field: Field,
    source_field: Field,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    /// Uncommitted writes are buffered
    dirty: AtomicBool,
}

impl ManagedIndex {
    fn field(&self, name: &str) -> Result<Field> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| SearchError::SchemaError(format!("unknown field {name:?}")))
    }

    fn kind(&self, name: &str) -> Option<FieldKind> {
        self.definition.field(name).map(|f| f.kind)
    }
}

/// Build the tantivy schema for a definition
fn build_schema(definition: &IndexSchema) -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field(ID_FIELD, STRING | STORED);
    builder.add_text_field(SOURCE_FIELD, STORED);

    for field in &definition.fields {
        match field.kind {
            FieldKind::Text => builder.add_text_field(&field.name, TEXT | STORED),
            FieldKind::Keyword => builder.add_text_field(&field.name, STRING | STORED),
            FieldKind::Integer => builder.add_i64_field(&field.name, INDEXED | STORED | FAST),
        };
    }

    builder.build()
}

/// Multi-index [`DocumentStore`] on local tantivy indices
pub struct TantivyStore {
    config: SearchConfig,
    indices: RwLock<HashMap<String, Arc<ManagedIndex>>>,
}

impl TantivyStore {
    /// Open a store rooted at `config.index_path`
    pub fn open(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        info!(path = %config.index_path.display(), "Opened search store");

        Ok(Self {
            config,
            indices: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn index_dir(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(SearchError::IndexNotFound(format!("invalid index name {name:?}")));
        }
        Ok(self.config.index_path.join(name))
    }

    fn on_disk(dir: &Path) -> bool {
        dir.join("meta.json").exists() && dir.join(SCHEMA_FILE).exists()
    }

    /// Wire up writer and reader for an opened or freshly created index
    fn manage(&self, index: Index, definition: IndexSchema) -> Result<ManagedIndex> {
        let schema = index.schema();
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| SearchError::SchemaError(e.to_string()))
        };

        let id_field = field(ID_FIELD)?;
        let source_field = field(SOURCE_FIELD)?;
        let mut fields = HashMap::with_capacity(definition.fields.len());
        for f in &definition.fields {
            fields.insert(f.name.clone(), field(&f.name)?);
        }

        let writer = index
            .writer_with_num_threads(self.config.indexing_threads, self.config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(ManagedIndex {
            index,
            definition,
            fields,
            id_field,
            source_field,
            writer: Mutex::new(writer),
            reader,
            dirty: AtomicBool::new(false),
        })
    }

    /// Open `name`, loading it from disk on first use
    fn get(&self, name: &str) -> Result<Arc<ManagedIndex>> {
        if let Some(managed) = self.indices.read().get(name) {
            return Ok(managed.clone());
        }

        let mut indices = self.indices.write();
        if let Some(managed) = indices.get(name) {
            return Ok(managed.clone());
        }

        let dir = self.index_dir(name)?;
        if !Self::on_disk(&dir) {
            return Err(SearchError::IndexNotFound(name.to_string()));
        }

        let raw = std::fs::read_to_string(dir.join(SCHEMA_FILE))?;
        let definition = IndexSchema::from_json(&raw)?;
        let index = Index::open_in_dir(&dir).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
        })?;

        let managed = Arc::new(self.manage(index, definition)?);
        indices.insert(name.to_string(), managed.clone());
        debug!(index = name, "Loaded index from disk");
        Ok(managed)
    }

    /// Commit pending writes on every open index
    pub async fn commit_all(&self) -> Result<()> {
        let open: Vec<Arc<ManagedIndex>> = self.indices.read().values().cloned().collect();
        for managed in open {
            let mut writer = managed.writer.lock().await;
            if !managed.dirty.swap(false, Ordering::AcqRel) {
                continue;
            }
            if let Err(e) = Self::commit(&managed, &mut writer) {
                managed.dirty.store(true, Ordering::Release);
                return Err(e);
            }
        }
        Ok(())
    }

    fn commit(managed: &ManagedIndex, writer: &mut IndexWriter) -> Result<()> {
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        managed
            .reader
            .reload()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to reload reader: {}", e)))
    }

    /// Start periodic commits for buffered writes; `None` in realtime mode
    pub fn start_committer(self: &Arc<Self>) -> Option<IndexCommitter> {
        if self.config.realtime_indexing {
            return None;
        }

        let period = Duration::from_secs(self.config.commit_interval_secs);
        let (shutdown, mut stopped) = watch::channel(false);
        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = store.commit_all().await {
                            warn!(error = %e, "Periodic commit failed");
                        }
                    }
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Started index committer");
        Some(IndexCommitter { shutdown, handle })
    }

    /// Map a raw JSON document to a tantivy document
    fn to_tantivy_doc(
        managed: &ManagedIndex,
        doc_id: &str,
        raw: &str,
        source: &serde_json::Value,
    ) -> Result<TantivyDocument> {
        let mut doc = TantivyDocument::new();
        doc.add_text(managed.id_field, doc_id);
        doc.add_text(managed.source_field, raw);

        for field_def in &managed.definition.fields {
            let field = managed.field(&field_def.name)?;
            let Some(value) = source.pointer(&field_def.pointer()) else {
                continue;
            };

            let values: Vec<&serde_json::Value> = match value {
                serde_json::Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };

            for value in values {
                match (field_def.kind, value) {
                    (_, serde_json::Value::Null) => {}
                    (FieldKind::Integer, v) => {
                        let n = v
                            .as_i64()
                            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
                            .ok_or_else(|| SearchError::InvalidDocument {
                                id: doc_id.to_string(),
                                message: format!("field {} is not an integer", field_def.name),
                            })?;
                        doc.add_i64(field, n);
                    }
                    (_, serde_json::Value::String(s)) => doc.add_text(field, s),
                    (_, v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => {
                        doc.add_text(field, v.to_string())
                    }
                    (_, _) => {
                        return Err(SearchError::InvalidDocument {
                            id: doc_id.to_string(),
                            message: format!("field {} must be a scalar", field_def.name),
                        })
                    }
                }
            }
        }

        Ok(doc)
    }

    /// Terms the field's analyzer produces for `text`
    fn analyze(managed: &ManagedIndex, field: Field, text: &str) -> Result<Vec<Term>> {
        let mut analyzer = managed
            .index
            .tokenizer_for_field(field)
            .map_err(|e| SearchError::SchemaError(format!("No analyzer for field: {}", e)))?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(Term::from_field_text(field, &stream.token().text));
        }
        Ok(terms)
    }

    fn clause_query(managed: &ManagedIndex, clause: &Clause) -> Result<Option<Box<dyn Query>>> {
        let field = managed.field(clause.field())?;

        let terms = match clause {
            Clause::Match { text, .. } => match managed.kind(clause.field()) {
                Some(FieldKind::Text) => Self::analyze(managed, field, text)?,
                _ => vec![Term::from_field_text(field, text)],
            },
            Clause::Terms { values, .. } => values
                .iter()
                .map(|v| Term::from_field_text(field, v))
                .collect(),
        };
        if terms.is_empty() {
            return Ok(None);
        }

        let option = match clause {
            Clause::Match { .. } => IndexRecordOption::WithFreqs,
            Clause::Terms { .. } => IndexRecordOption::Basic,
        };
        let subqueries: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|term| {
                (
                    Occur::Should,
                    Box::new(TermQuery::new(term, option)) as Box<dyn Query>,
                )
            })
            .collect();

        Ok(Some(Box::new(BoostQuery::new(
            Box::new(BooleanQuery::new(subqueries)),
            clause.boost(),
        ))))
    }

    fn filter_query(managed: &ManagedIndex, filter: &Filter) -> Result<Box<dyn Query>> {
        let field = managed.field(&filter.field)?;
        if managed.kind(&filter.field) != Some(FieldKind::Integer) {
            return Err(SearchError::SchemaError(format!(
                "filter field {} is not an integer",
                filter.field
            )));
        }
        let term = TermQuery::new(
            Term::from_field_i64(field, filter.value),
            IndexRecordOption::Basic,
        );
        Ok(Box::new(ConstScoreQuery::new(Box::new(term), 0.0)))
    }

    /// Compile a store query; `None` when nothing can match
    fn compile(managed: &ManagedIndex, query: &StoreQuery) -> Result<Option<Box<dyn Query>>> {
        let mut should = Vec::with_capacity(query.should.len());
        for clause in &query.should {
            if let Some(q) = Self::clause_query(managed, clause)? {
                should.push((Occur::Should, q));
            }
        }
        if should.is_empty() {
            return Ok(None);
        }

        let mut must: Vec<(Occur, Box<dyn Query>)> =
            vec![(Occur::Must, Box::new(BooleanQuery::new(should)))];
        for filter in &query.filters {
            must.push((Occur::Must, Self::filter_query(managed, filter)?));
        }

        Ok(Some(Box::new(BooleanQuery::new(must))))
    }

    fn snippet_generators(
        &self,
        managed: &ManagedIndex,
        searcher: &Searcher,
        query: &dyn Query,
        fields: &[String],
    ) -> Result<Vec<(String, SnippetGenerator)>> {
        if !self.config.enable_highlighting {
            return Ok(Vec::new());
        }

        let mut generators = Vec::new();
        for name in fields {
            if managed.kind(name) != Some(FieldKind::Text) {
                continue;
            }
            let mut generator = SnippetGenerator::create(searcher, query, managed.field(name)?)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to highlight: {}", e)))?;
            generator.set_max_num_chars(self.config.highlight_max_chars);
            generators.push((name.clone(), generator));
        }
        Ok(generators)
    }
}

/// Handle to the periodic commit task
pub struct IndexCommitter {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl IndexCommitter {
    /// Stop the task and wait for an in-flight commit to finish
    pub async fn stop(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Index committer task failed");
        }
    }
}

#[async_trait]
impl DocumentStore for TantivyStore {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        if self.indices.read().contains_key(index) {
            return Ok(true);
        }
        Ok(Self::on_disk(&self.index_dir(index)?))
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<()> {
        let dir = self.index_dir(index)?;
        let mut indices = self.indices.write();
        if indices.contains_key(index) || Self::on_disk(&dir) {
            return Err(SearchError::IndexInitFailed(format!(
                "index {index} already exists"
            )));
        }

        std::fs::create_dir_all(&dir)?;
        let tantivy_index = Index::create_in_dir(&dir, build_schema(schema)).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
        })?;
        let raw = serde_json::to_string_pretty(schema)
            .map_err(|e| SearchError::SchemaError(e.to_string()))?;
        std::fs::write(dir.join(SCHEMA_FILE), raw)?;

        let managed = self.manage(tantivy_index, schema.clone())?;
        indices.insert(index.to_string(), Arc::new(managed));

        info!(index, fields = schema.fields.len(), "Created index");
        Ok(())
    }

    async fn index_document(&self, index: &str, doc_id: &str, document: &str) -> Result<()> {
        let managed = self.get(index)?;

        let source: serde_json::Value =
            serde_json::from_str(document).map_err(|e| SearchError::InvalidDocument {
                id: doc_id.to_string(),
                message: e.to_string(),
            })?;
        let doc = Self::to_tantivy_doc(&managed, doc_id, document, &source)?;

        let mut writer = managed.writer.lock().await;

        // Replace any prior version
        writer.delete_term(Term::from_field_text(managed.id_field, doc_id));
        writer
            .add_document(doc)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        managed.dirty.store(true, Ordering::Release);
        if self.config.realtime_indexing {
            Self::commit(&managed, &mut writer)?;
            managed.dirty.store(false, Ordering::Release);
        }

        debug!(index, doc_id, "Indexed document");
        Ok(())
    }

    async fn search(&self, index: &str, query: &StoreQuery) -> Result<Vec<StoreHit>> {
        let managed = self.get(index)?;
        if query.size == 0 {
            return Ok(Vec::new());
        }
        let limit = query.size.min(self.config.max_results);
        let window = self.config.max_result_window;
        if query.offset.saturating_add(limit) > window {
            return Err(SearchError::ResultWindowExceeded {
                offset: query.offset,
                limit,
                window,
            });
        }

        let Some(compiled) = Self::compile(&managed, query)? else {
            return Ok(Vec::new());
        };

        let searcher = managed.reader.searcher();
        let collector = TopDocs::with_limit(limit).and_offset(query.offset);
        let top_docs = searcher
            .search(&*compiled, &collector)
            .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

        let generators =
            self.snippet_generators(&managed, &searcher, &*compiled, &query.highlight)?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;

            let id = doc
                .get_first(managed.id_field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let raw = doc
                .get_first(managed.source_field)
                .and_then(|v| v.as_str())
                .unwrap_or("null");
            let source = serde_json::from_str(raw).map_err(|e| SearchError::InvalidDocument {
                id: id.clone(),
                message: e.to_string(),
            })?;

            let mut highlights = HashMap::new();
            for (name, generator) in &generators {
                let snippet = generator.snippet_from_doc(&doc);
                if !snippet.highlighted().is_empty() {
                    highlights.insert(name.clone(), vec![snippet.to_html()]);
                }
            }

            hits.push(StoreHit {
                id,
                score,
                source,
                highlights,
            });
        }

        Ok(hits)
    }

    async fn count(&self, index: &str) -> Result<u64> {
        let managed = self.get(index)?;
        Ok(managed.reader.searcher().num_docs())
    }
}
