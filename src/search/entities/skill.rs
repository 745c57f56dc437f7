use super::{es_val, SearchableEntity};
use crate::search::biz::Biz;
use crate::search::field::{EsVal, FieldConfig};
use crate::search::handler::EntityHits;
use crate::search::store::StoreHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillLevelDocument {
    pub id: i64,
    pub desc: String,
    pub questions: Vec<i64>,
    pub cases: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillDocument {
    pub id: i64,
    pub labels: Vec<String>,
    pub name: String,
    pub desc: String,
    pub basic: SkillLevelDocument,
    pub intermediate: SkillLevelDocument,
    pub advanced: SkillLevelDocument,
    pub utime: i64,
}

/// One proficiency level of a skill and the questions/cases that cover it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub id: i64,
    pub desc: EsVal,
    pub questions: Vec<i64>,
    pub cases: Vec<i64>,
}

impl SkillLevel {
    fn from_document(doc: SkillLevelDocument, level: &str, hit: &StoreHit) -> Self {
        Self {
            id: doc.id,
            desc: es_val(hit, &format!("{level}_desc"), doc.desc),
            questions: doc.questions,
            cases: doc.cases,
        }
    }
}

/// A skill as returned from search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: i64,
    pub labels: Vec<String>,
    pub name: EsVal,
    pub desc: EsVal,
    pub basic: SkillLevel,
    pub intermediate: SkillLevel,
    pub advanced: SkillLevel,
    pub utime: i64,
}

impl SearchableEntity for SkillRecord {
    const BIZ: Biz = Biz::Skill;

    const FIELDS: &'static [FieldConfig] = &[
        FieldConfig::text("name", 15).highlighted(),
        FieldConfig::term("labels", 3),
        FieldConfig::text("desc", 2).highlighted(),
        FieldConfig::text("basic_desc", 1).highlighted(),
        FieldConfig::text("intermediate_desc", 1).highlighted(),
        FieldConfig::text("advanced_desc", 1).highlighted(),
    ];

    type Document = SkillDocument;

    fn from_hit(doc: SkillDocument, hit: &StoreHit) -> Self {
        Self {
            id: doc.id,
            labels: doc.labels,
            name: es_val(hit, "name", doc.name),
            desc: es_val(hit, "desc", doc.desc),
            basic: SkillLevel::from_document(doc.basic, "basic", hit),
            intermediate: SkillLevel::from_document(doc.intermediate, "intermediate", hit),
            advanced: SkillLevel::from_document(doc.advanced, "advanced", hit),
            utime: doc.utime,
        }
    }

    fn into_hits(records: Vec<Self>) -> EntityHits {
        EntityHits::Skills(records)
    }
}
