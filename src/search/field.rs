//! Per-field query weighting and highlighted text values

use serde::{Deserialize, Serialize};

/// How a field is matched against the keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Analyzed matching against the whole keyword string
    FullText,
    /// Token-exact matching against the whitespace-split keyword list
    ExactTerm,
}

/// Static description of one queryable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldConfig {
    /// Field name in the index schema
    pub name: &'static str,

    /// Score multiplier; 0 means default weight
    pub boost: u32,

    pub match_mode: MatchMode,

    /// Request highlighted fragments for this field
    pub highlight: bool,
}

impl FieldConfig {
    /// Analyzed field
    pub const fn text(name: &'static str, boost: u32) -> Self {
        Self {
            name,
            boost,
            match_mode: MatchMode::FullText,
            highlight: false,
        }
    }

    /// Categorical field matched token-exact
    pub const fn term(name: &'static str, boost: u32) -> Self {
        Self {
            name,
            boost,
            match_mode: MatchMode::ExactTerm,
            highlight: false,
        }
    }

    /// Enable highlighting
    pub const fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }

    /// Effective multiplier applied at query time
    pub fn weight(&self) -> f32 {
        if self.boost == 0 {
            1.0
        } else {
            self.boost as f32
        }
    }
}

/// A text value returned from search, with any highlighted fragments.
///
/// `highlight_fragments` is only populated when the field is configured for
/// highlighting and the store actually produced a highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsVal {
    pub value: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight_fragments: Vec<String>,
}

impl EsVal {
    /// Value without highlighting
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            highlight_fragments: Vec::new(),
        }
    }

    /// Value with fragments returned by the store
    pub fn new(value: impl Into<String>, highlight_fragments: Vec<String>) -> Self {
        Self {
            value: value.into(),
            highlight_fragments,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        !self.highlight_fragments.is_empty()
    }

    /// Text suitable for a result listing: the fragments when present,
    /// otherwise the value cut to `max_chars` characters.
    pub fn display(&self, max_chars: usize) -> String {
        if self.is_highlighted() {
            return self.highlight_fragments.join(" … ");
        }

        if self.value.chars().count() <= max_chars {
            return self.value.clone();
        }

        let mut truncated: String = self.value.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }
}
