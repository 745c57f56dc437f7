//! Searchable entity types
//!
//! Each entity declares its tag, its weighted field table and how a stored
//! document plus highlights becomes a result record. [`StoreHandler`] turns
//! any such entity into an [`EntityHandler`] backed by a [`DocumentStore`].

mod case;
mod question;
mod question_set;
mod skill;

pub use case::CaseRecord;
pub use question::{Answer, AnswerElement, QuestionRecord};
pub use question_set::QuestionSetRecord;
pub use skill::{SkillLevel, SkillRecord};

use crate::search::biz::{Biz, IndexView};
use crate::search::error::Result;
use crate::search::field::{EsVal, FieldConfig};
use crate::search::handler::{EntityHandler, EntityHits};
use crate::search::query::{Page, QueryBuilder};
use crate::search::store::{DocumentStore, IndexSchema, StoreHit, StoreQuery};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A document type the engine can search
pub trait SearchableEntity: Sized + Send + Sync + 'static {
    const BIZ: Biz;

    /// Queried fields with their weights, highest boost first
    const FIELDS: &'static [FieldConfig];

    /// Shape of the raw document held by the store
    type Document: DeserializeOwned;

    /// Build a result record from a decoded document and its hit
    fn from_hit(doc: Self::Document, hit: &StoreHit) -> Self;

    fn into_hits(records: Vec<Self>) -> EntityHits;
}

/// Embedded index schema for `biz`
pub fn schema_for(biz: Biz) -> Result<IndexSchema> {
    let raw = match biz {
        Biz::Case => include_str!("../schemas/case.json"),
        Biz::Question => include_str!("../schemas/question.json"),
        Biz::Skill => include_str!("../schemas/skill.json"),
        Biz::QuestionSet => include_str!("../schemas/question_set.json"),
    };
    IndexSchema::from_json(raw)
}

/// Wrap `value` with whatever fragments the store returned for `field`
fn es_val(hit: &StoreHit, field: &str, value: String) -> EsVal {
    EsVal::new(value, hit.highlight(field).to_vec())
}

/// [`EntityHandler`] that queries one index of a [`DocumentStore`]
pub struct StoreHandler<E> {
    store: Arc<dyn DocumentStore>,
    view: IndexView,
    highlight: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SearchableEntity> StoreHandler<E> {
    pub fn new(store: Arc<dyn DocumentStore>, view: IndexView) -> Self {
        Self {
            store,
            view,
            highlight: true,
            _entity: PhantomData,
        }
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn index(&self) -> &'static str {
        E::BIZ.index_name(self.view)
    }

    /// Store query for `keywords`; drafts are only hidden in the published view
    pub fn query(&self, keywords: &str, page: Page) -> StoreQuery {
        let mut builder = QueryBuilder::new(E::FIELDS, keywords)
            .with_page(page)
            .with_highlight(self.highlight);
        if self.view == IndexView::Published && E::BIZ.has_publication() {
            builder = builder.published_only();
        }
        builder.build()
    }
}

#[async_trait]
impl<E: SearchableEntity> EntityHandler for StoreHandler<E> {
    fn biz(&self) -> Biz {
        E::BIZ
    }

    async fn search(&self, keywords: &str, page: Page) -> Result<EntityHits> {
        let query = self.query(keywords, page);
        if query.should.is_empty() {
            return Ok(E::into_hits(Vec::new()));
        }

        let hits = self.store.search(self.index(), &query).await?;
        debug!(biz = %E::BIZ, index = self.index(), hits = hits.len(), "Entity search completed");

        let records = hits
            .iter()
            .map(|hit| hit.decode::<E::Document>().map(|doc| E::from_hit(doc, hit)))
            .collect::<Result<Vec<_>>>()?;

        Ok(E::into_hits(records))
    }
}
