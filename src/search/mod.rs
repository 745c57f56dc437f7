//! Cross-entity search
//!
//! One free-text expression, `biz:<target>:<keywords>`, is fanned out over
//! the indexed entity types (cases, questions, skills, question sets) and
//! the per-entity results are merged into a single [`SearchResult`].
//!
//! ```text
//!   "biz:all:redis"
//!         │
//!         ▼
//! ┌──────────────────┐   parse    ┌────────────────┐
//! │   SearchEngine   │──────────▶│ QueryExpression │
//! └──────────────────┘            └────────────────┘
//!         │ fan-out (one task per handler, shared deadline)
//!         ▼
//! ┌──────────────────┐  QueryBuilder  ┌───────────────┐
//! │  EntityHandler   │──────────────▶│ DocumentStore  │
//! │  (per Biz tag)   │◀──────────────│ (TantivyStore) │
//! └──────────────────┘   StoreHits    └───────────────┘
//!         │ merge after all handlers return
//!         ▼
//!   SearchResult { cases, questions, skills, questionSets }
//! ```
//!
//! Each entity declares a weighted field table ([`FieldConfig`]). Analyzed
//! fields are matched against the whole keyword string, categorical fields
//! such as labels are matched token-exact, and every clause carries its
//! boost. Cases and questions are restricted to published documents when
//! searching the published view.
//!
//! Indices are created at startup through [`IndexBootstrap`] and kept up to
//! date by the [`sync`](crate::sync) consumer.
//!
//! # Example
//!
//! ```no_run
//! use skill_search::search::{IndexBootstrap, IndexView, SearchConfig, SearchEngine, TantivyStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig::default();
//! let store = Arc::new(TantivyStore::open(config.clone())?);
//!
//! IndexBootstrap::new(store.clone())
//!     .ensure_view(IndexView::Published)
//!     .await?;
//!
//! let engine = SearchEngine::for_store(store, IndexView::Published, &config);
//! let result = engine.search("biz:all:redis").await?;
//! println!("{} hits", result.total());
//! # Ok(())
//! # }
//! ```

pub mod biz;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod expression;
pub mod field;
pub mod handler;
pub mod index;
pub mod metrics;
pub mod query;
pub mod result;
pub mod store;

pub use biz::{Biz, IndexView};
pub use bootstrap::IndexBootstrap;
pub use config::{SearchConfig, SearchConfigBuilder};
pub use engine::SearchEngine;
pub use entities::{
    schema_for, Answer, AnswerElement, CaseRecord, QuestionRecord, QuestionSetRecord,
    SearchableEntity, SkillLevel, SkillRecord, StoreHandler,
};
pub use error::{Result, SearchError};
pub use expression::{ParseError, QueryExpression};
pub use field::{EsVal, FieldConfig, MatchMode};
pub use handler::{EntityHandler, EntityHits};
pub use index::{IndexCommitter, TantivyStore};
pub use query::{Page, QueryBuilder};
pub use result::SearchResult;
pub use store::{DocumentStore, IndexSchema, StoreHit, StoreQuery};
