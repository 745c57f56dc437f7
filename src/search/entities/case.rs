use super::{es_val, SearchableEntity};
use crate::search::biz::Biz;
use crate::search::field::{EsVal, FieldConfig};
use crate::search::handler::EntityHits;
use crate::search::store::StoreHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaseDocument {
    pub id: i64,
    pub uid: i64,
    pub labels: Vec<String>,
    pub title: String,
    pub content: String,
    pub github_repo: String,
    pub gitee_repo: String,
    pub keywords: String,
    pub shorthand: String,
    pub introduction: String,
    pub guidance: String,
    pub status: i64,
    pub utime: i64,
}

/// A case as returned from search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: i64,
    pub uid: i64,
    pub labels: Vec<String>,
    pub title: EsVal,
    pub content: EsVal,
    pub github_repo: String,
    pub gitee_repo: String,
    pub keywords: EsVal,
    pub shorthand: EsVal,
    pub introduction: EsVal,
    pub guidance: EsVal,
    pub status: i64,
    pub utime: i64,
}

impl SearchableEntity for CaseRecord {
    const BIZ: Biz = Biz::Case;

    const FIELDS: &'static [FieldConfig] = &[
        FieldConfig::text("title", 15).highlighted(),
        FieldConfig::term("labels", 3),
        FieldConfig::text("keywords", 3).highlighted(),
        FieldConfig::text("shorthand", 3).highlighted(),
        FieldConfig::text("content", 2).highlighted(),
        FieldConfig::text("introduction", 2).highlighted(),
        FieldConfig::text("guidance", 1).highlighted(),
    ];

    type Document = CaseDocument;

    fn from_hit(doc: CaseDocument, hit: &StoreHit) -> Self {
        Self {
            id: doc.id,
            uid: doc.uid,
            labels: doc.labels,
            title: es_val(hit, "title", doc.title),
            content: es_val(hit, "content", doc.content),
            github_repo: doc.github_repo,
            gitee_repo: doc.gitee_repo,
            keywords: es_val(hit, "keywords", doc.keywords),
            shorthand: es_val(hit, "shorthand", doc.shorthand),
            introduction: es_val(hit, "introduction", doc.introduction),
            guidance: es_val(hit, "guidance", doc.guidance),
            status: doc.status,
            utime: doc.utime,
        }
    }

    fn into_hits(records: Vec<Self>) -> EntityHits {
        EntityHits::Cases(records)
    }
}
