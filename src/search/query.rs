//! Search query building
//!
//! [`QueryBuilder`] turns a keyword string plus an entity's field table into
//! a store-neutral [`StoreQuery`]: one boosted clause per field, OR-ed
//! together, with optional hard filters and pagination.

use crate::search::field::{FieldConfig, MatchMode};
use crate::search::store::{Clause, Filter, StoreQuery};
use serde::{Deserialize, Serialize};

/// Results per entity when the caller gives no limit
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Deepest `offset + limit` a search may reach
pub const DEFAULT_RESULT_WINDOW: usize = 10_000;

/// Integer status field shared by entities with a publication lifecycle
pub const STATUS_FIELD: &str = "status";

/// Status value of a published case or question
pub const PUBLISHED_STATUS: i64 = 2;

/// Offset/limit forwarded to each entity query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Clamp the limit to `max`
    pub fn capped(self, max: usize) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max),
        }
    }

    /// One past the last requested position, `None` on overflow
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.limit)
    }
}

/// Builds a [`StoreQuery`] from an entity's field table
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    fields: &'a [FieldConfig],
    keywords: String,
    filters: Vec<Filter>,
    page: Page,
    highlight: bool,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder for `keywords` over `fields`
    pub fn new(fields: &'a [FieldConfig], keywords: impl Into<String>) -> Self {
        Self {
            fields,
            keywords: keywords.into(),
            filters: Vec::new(),
            page: Page::default(),
            highlight: true,
        }
    }

    /// Require an integer field to equal `value`
    pub fn with_filter(mut self, field: impl Into<String>, value: i64) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value,
        });
        self
    }

    /// Restrict results to published documents
    pub fn published_only(self) -> Self {
        self.with_filter(STATUS_FIELD, PUBLISHED_STATUS)
    }

    /// Set pagination
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Enable/disable highlighting for the highlight-enabled fields
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Keyword list used for exact-term fields
    fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for term in self.keywords.split_whitespace() {
            if !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }
        terms
    }

    /// Build the store query
    pub fn build(&self) -> StoreQuery {
        let terms = self.terms();
        let mut should = Vec::with_capacity(self.fields.len());

        if !terms.is_empty() {
            for field in self.fields {
                let clause = match field.match_mode {
                    MatchMode::FullText => Clause::Match {
                        field: field.name.to_string(),
                        text: self.keywords.clone(),
                        boost: field.weight(),
                    },
                    MatchMode::ExactTerm => Clause::Terms {
                        field: field.name.to_string(),
                        values: terms.clone(),
                        boost: field.weight(),
                    },
                };
                should.push(clause);
            }
        }

        let highlight = if self.highlight {
            self.fields
                .iter()
                .filter(|f| f.highlight)
                .map(|f| f.name.to_string())
                .collect()
        } else {
            Vec::new()
        };

        StoreQuery {
            should,
            filters: self.filters.clone(),
            highlight,
            offset: self.page.offset,
            size: self.page.limit,
        }
    }
}
