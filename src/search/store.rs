//! Document store abstraction
//!
//! The search core talks to its backing store only through [`DocumentStore`]:
//! existence checks and creation for bootstrap, single-document upserts for
//! the sync consumer, and weighted queries for the entity handlers.

use crate::search::error::{Result, SearchError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a schema field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Analyzed full text
    Text,
    /// Untokenized string, matched exactly
    Keyword,
    /// Signed integer, usable in filters
    Integer,
}

/// One indexed field of an [`IndexSchema`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,

    pub kind: FieldKind,

    /// JSON pointer into the raw document; defaults to `/<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FieldSchema {
    /// JSON pointer used to extract the field's value(s)
    pub fn pointer(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("/{}", self.name))
    }
}

/// Index definition. The raw document is always kept alongside, so only
/// fields that are queried or filtered need to be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub fields: Vec<FieldSchema>,
}

impl IndexSchema {
    /// Parse an embedded JSON schema definition
    pub fn from_json(raw: &str) -> Result<Self> {
        let schema: IndexSchema =
            serde_json::from_str(raw).map_err(|e| SearchError::SchemaError(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for field in &schema.fields {
            if field.name.is_empty() || field.name.starts_with('_') {
                return Err(SearchError::SchemaError(format!(
                    "invalid field name {:?}",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SearchError::SchemaError(format!(
                    "duplicate field {:?}",
                    field.name
                )));
            }
        }

        Ok(schema)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A scored sub-query; clauses of one [`StoreQuery`] are OR-ed together
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Analyzed match of `text` against a text field
    Match {
        field: String,
        text: String,
        boost: f32,
    },
    /// Exact match of any of `values` against a keyword field
    Terms {
        field: String,
        values: Vec<String>,
        boost: f32,
    },
}

impl Clause {
    pub fn field(&self) -> &str {
        match self {
            Clause::Match { field, .. } | Clause::Terms { field, .. } => field,
        }
    }

    pub fn boost(&self) -> f32 {
        match self {
            Clause::Match { boost, .. } | Clause::Terms { boost, .. } => *boost,
        }
    }
}

/// Non-scoring equality filter on an integer field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: i64,
}

/// Store-neutral query: should-match-any clauses, must-match filters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreQuery {
    pub should: Vec<Clause>,
    pub filters: Vec<Filter>,
    /// Fields to return highlighted fragments for
    pub highlight: Vec<String>,
    pub offset: usize,
    pub size: usize,
}

/// One search hit, carrying the raw indexed document
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub id: String,
    pub score: f32,
    pub source: serde_json::Value,
    /// Highlighted fragments keyed by field name
    pub highlights: HashMap<String, Vec<String>>,
}

impl StoreHit {
    /// Decode the raw document into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.source).map_err(|e| SearchError::InvalidDocument {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }

    /// Fragments returned for `field`, empty when none
    pub fn highlight(&self, field: &str) -> &[String] {
        self.highlights
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Document store primitives used by the search core
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether `index` exists
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create `index` from `schema`; fails if it already exists
    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<()>;

    /// Index `document` (raw JSON) under `doc_id`, replacing any prior version
    async fn index_document(&self, index: &str, doc_id: &str, document: &str) -> Result<()>;

    /// Run `query` against `index`, best match first
    async fn search(&self, index: &str, query: &StoreQuery) -> Result<Vec<StoreHit>>;

    /// Number of live documents in `index`
    async fn count(&self, index: &str) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_pointer_defaults_to_name() {
        let schema = IndexSchema::from_json(
            r#"{"fields":[
                {"name":"title","kind":"text"},
                {"name":"basic_desc","kind":"text","path":"/basic/desc"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(schema.field("title").unwrap().pointer(), "/title");
        assert_eq!(schema.field("basic_desc").unwrap().pointer(), "/basic/desc");
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_schema_rejects_reserved_and_duplicate_names() {
        assert!(IndexSchema::from_json(r#"{"fields":[{"name":"_id","kind":"keyword"}]}"#).is_err());
        assert!(IndexSchema::from_json(
            r#"{"fields":[{"name":"a","kind":"text"},{"name":"a","kind":"keyword"}]}"#
        )
        .is_err());
        assert!(IndexSchema::from_json(r#"{"fields":[{"name":"a","kind":"vector"}]}"#).is_err());
    }

    #[test]
    fn test_hit_decode_failure_names_document() {
        #[derive(Debug, Deserialize)]
        struct Doc {
            #[allow(dead_code)]
            id: i64,
        }

        let hit = StoreHit {
            id: "42".to_string(),
            score: 1.0,
            source: serde_json::json!({ "id": "not-a-number" }),
            highlights: HashMap::new(),
        };
        let err = hit.decode::<Doc>().unwrap_err();
        assert!(matches!(err, SearchError::InvalidDocument { ref id, .. } if id == "42"));
        assert!(hit.highlight("title").is_empty());
    }
}
