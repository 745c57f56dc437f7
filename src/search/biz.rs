//! Business tags and the fixed tag → index table

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Searchable entity categories
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Biz {
    #[strum(serialize = "case")]
    #[serde(rename = "case")]
    Case,

    #[strum(serialize = "question")]
    #[serde(rename = "question")]
    Question,

    #[strum(serialize = "skill")]
    #[serde(rename = "skill")]
    Skill,

    #[strum(serialize = "questionSet")]
    #[serde(rename = "questionSet")]
    QuestionSet,
}

/// Which physical index family a read or write targets.
///
/// Creators work against the admin view (drafts included); end users read
/// the published view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexView {
    Published,
    Admin,
}

impl Biz {
    /// Index holding this entity's documents for `view`
    pub fn index_name(self, view: IndexView) -> &'static str {
        let (published, admin) = match self {
            Biz::Case => ("case_index", "case_admin_index"),
            Biz::Question => ("question_index", "question_admin_index"),
            Biz::Skill => ("skill_index", "skill_admin_index"),
            Biz::QuestionSet => ("question_set_index", "question_set_admin_index"),
        };
        match view {
            IndexView::Published => published,
            IndexView::Admin => admin,
        }
    }

    /// Whether the entity goes through a draft → published lifecycle
    pub fn has_publication(self) -> bool {
        matches!(self, Biz::Case | Biz::Question)
    }

    /// All tags in registry order
    pub fn all() -> impl Iterator<Item = Biz> {
        Biz::iter()
    }
}
