//! Aggregated search result

use crate::search::entities::{CaseRecord, QuestionRecord, QuestionSetRecord, SkillRecord};
use crate::search::handler::EntityHits;
use serde::{Deserialize, Serialize};

/// Result of one search request, one collection per entity type.
///
/// Built by the engine's coordinator after every handler has returned, so it
/// is never shared between tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub cases: Vec<CaseRecord>,
    pub questions: Vec<QuestionRecord>,
    pub skills: Vec<SkillRecord>,
    pub question_sets: Vec<QuestionSetRecord>,
}

impl SearchResult {
    /// Fold one handler's records into the matching collection
    pub fn merge(&mut self, hits: EntityHits) {
        match hits {
            EntityHits::Cases(mut v) => self.cases.append(&mut v),
            EntityHits::Questions(mut v) => self.questions.append(&mut v),
            EntityHits::Skills(mut v) => self.skills.append(&mut v),
            EntityHits::QuestionSets(mut v) => self.question_sets.append(&mut v),
        }
    }

    pub fn total(&self) -> usize {
        self.cases.len() + self.questions.len() + self.skills.len() + self.question_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<EntityHits> for SearchResult {
    fn from_iter<I: IntoIterator<Item = EntityHits>>(iter: I) -> Self {
        let mut result = SearchResult::default();
        for hits in iter {
            result.merge(hits);
        }
        result
    }
}
