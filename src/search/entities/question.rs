use super::{es_val, SearchableEntity};
use crate::search::biz::Biz;
use crate::search::field::{EsVal, FieldConfig};
use crate::search::handler::EntityHits;
use crate::search::store::StoreHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnswerElementDocument {
    pub id: i64,
    pub content: String,
    pub keywords: String,
    pub shorthand: String,
    pub highlight: String,
    pub guidance: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnswerDocument {
    pub analysis: AnswerElementDocument,
    pub basic: AnswerElementDocument,
    pub intermediate: AnswerElementDocument,
    pub advanced: AnswerElementDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestionDocument {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub labels: Vec<String>,
    pub content: String,
    pub status: i64,
    pub utime: i64,
    pub answer: AnswerDocument,
}

/// One difficulty tier of an answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerElement {
    pub id: i64,
    pub content: EsVal,
    pub keywords: EsVal,
    pub shorthand: EsVal,
    pub highlight: String,
    pub guidance: String,
}

impl AnswerElement {
    /// Tier fields are indexed as `<tier>_<field>`
    fn from_document(doc: AnswerElementDocument, tier: &str, hit: &StoreHit) -> Self {
        Self {
            id: doc.id,
            content: es_val(hit, &format!("{tier}_content"), doc.content),
            keywords: es_val(hit, &format!("{tier}_keywords"), doc.keywords),
            shorthand: es_val(hit, &format!("{tier}_shorthand"), doc.shorthand),
            highlight: doc.highlight,
            guidance: doc.guidance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub analysis: AnswerElement,
    pub basic: AnswerElement,
    pub intermediate: AnswerElement,
    pub advanced: AnswerElement,
}

/// A question as returned from search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub uid: i64,
    pub title: EsVal,
    pub labels: Vec<String>,
    pub content: EsVal,
    pub status: i64,
    pub utime: i64,
    pub answer: Answer,
}

impl SearchableEntity for QuestionRecord {
    const BIZ: Biz = Biz::Question;

    const FIELDS: &'static [FieldConfig] = &[
        FieldConfig::text("title", 15).highlighted(),
        FieldConfig::term("labels", 3),
        FieldConfig::text("analysis_keywords", 3),
        FieldConfig::text("basic_keywords", 3),
        FieldConfig::text("intermediate_keywords", 3),
        FieldConfig::text("advanced_keywords", 3),
        FieldConfig::text("content", 2).highlighted(),
        FieldConfig::text("analysis_shorthand", 2),
        FieldConfig::text("basic_shorthand", 2),
        FieldConfig::text("intermediate_shorthand", 2),
        FieldConfig::text("advanced_shorthand", 2),
        FieldConfig::text("analysis_content", 1).highlighted(),
        FieldConfig::text("basic_content", 1).highlighted(),
        FieldConfig::text("intermediate_content", 1).highlighted(),
        FieldConfig::text("advanced_content", 1).highlighted(),
    ];

    type Document = QuestionDocument;

    fn from_hit(doc: QuestionDocument, hit: &StoreHit) -> Self {
        let answer = doc.answer;
        Self {
            id: doc.id,
            uid: doc.uid,
            title: es_val(hit, "title", doc.title),
            labels: doc.labels,
            content: es_val(hit, "content", doc.content),
            status: doc.status,
            utime: doc.utime,
            answer: Answer {
                analysis: AnswerElement::from_document(answer.analysis, "analysis", hit),
                basic: AnswerElement::from_document(answer.basic, "basic", hit),
                intermediate: AnswerElement::from_document(answer.intermediate, "intermediate", hit),
                advanced: AnswerElement::from_document(answer.advanced, "advanced", hit),
            },
        }
    }

    fn into_hits(records: Vec<Self>) -> EntityHits {
        EntityHits::Questions(records)
    }
}
