use super::{es_val, SearchableEntity};
use crate::search::biz::Biz;
use crate::search::field::{EsVal, FieldConfig};
use crate::search::handler::EntityHits;
use crate::search::store::StoreHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestionSetDocument {
    pub id: i64,
    pub uid: i64,
    pub title: String,
    pub description: String,
    pub questions: Vec<i64>,
    pub utime: i64,
}

/// A question set as returned from search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSetRecord {
    pub id: i64,
    pub uid: i64,
    pub title: EsVal,
    pub description: EsVal,
    pub questions: Vec<i64>,
    pub utime: i64,
}

impl SearchableEntity for QuestionSetRecord {
    const BIZ: Biz = Biz::QuestionSet;

    const FIELDS: &'static [FieldConfig] = &[
        FieldConfig::text("title", 15).highlighted(),
        FieldConfig::text("description", 2).highlighted(),
    ];

    type Document = QuestionSetDocument;

    fn from_hit(doc: QuestionSetDocument, hit: &StoreHit) -> Self {
        Self {
            id: doc.id,
            uid: doc.uid,
            title: es_val(hit, "title", doc.title),
            description: es_val(hit, "description", doc.description),
            questions: doc.questions,
            utime: doc.utime,
        }
    }

    fn into_hits(records: Vec<Self>) -> EntityHits {
        EntityHits::QuestionSets(records)
    }
}
