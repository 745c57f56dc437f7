//! Per-entity search capability used by the dispatch engine

use crate::search::biz::Biz;
use crate::search::entities::{CaseRecord, QuestionRecord, QuestionSetRecord, SkillRecord};
use crate::search::error::Result;
use crate::search::query::Page;
use async_trait::async_trait;

/// Records produced by one handler, tagged with their entity type
#[derive(Debug, Clone, PartialEq)]
pub enum EntityHits {
    Cases(Vec<CaseRecord>),
    Questions(Vec<QuestionRecord>),
    Skills(Vec<SkillRecord>),
    QuestionSets(Vec<QuestionSetRecord>),
}

impl EntityHits {
    pub fn biz(&self) -> Biz {
        match self {
            EntityHits::Cases(_) => Biz::Case,
            EntityHits::Questions(_) => Biz::Question,
            EntityHits::Skills(_) => Biz::Skill,
            EntityHits::QuestionSets(_) => Biz::QuestionSet,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityHits::Cases(v) => v.len(),
            EntityHits::Questions(v) => v.len(),
            EntityHits::Skills(v) => v.len(),
            EntityHits::QuestionSets(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Searches one entity type.
///
/// Implementations are registered with the
/// [`SearchEngine`](crate::search::SearchEngine) under the tag returned by
/// [`biz`](EntityHandler::biz) and may be called concurrently.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    /// Tag this handler answers for
    fn biz(&self) -> Biz;

    /// Search this entity's documents for `keywords`
    async fn search(&self, keywords: &str, page: Page) -> Result<EntityHits>;
}
