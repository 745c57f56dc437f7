//! Index sync event definitions

use crate::search::Biz;
use serde::{Deserialize, Deserializer, Serialize};

/// Topic carrying changes for the published indices
pub const SYNC_TOPIC: &str = "sync_data_to_search";

/// Topic carrying changes for the admin indices
pub const ADMIN_SYNC_TOPIC: &str = "sync_data_to_admin_search";

/// Consumer group shared by all sync consumer instances
pub const SYNC_CONSUMER_GROUP: &str = "search-index-sync";

/// A change to one searchable record.
///
/// `biz` is kept as the raw tag so that events for unknown entity types
/// still decode and can be rejected by routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub biz: String,

    /// Document id; producers send it as a string or an integer
    #[serde(rename = "bizID", deserialize_with = "string_or_int")]
    pub biz_id: String,

    /// JSON-encoded document
    pub data: String,
}

impl SyncEvent {
    pub fn new(biz: Biz, biz_id: impl ToString, data: impl Into<String>) -> Self {
        Self {
            biz: biz.to_string(),
            biz_id: biz_id.to_string(),
            data: data.into(),
        }
    }

    /// Event carrying `document` serialized as JSON
    pub fn from_document<T: Serialize>(
        biz: Biz,
        biz_id: impl ToString,
        document: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(biz, biz_id, serde_json::to_string(document)?))
    }

    /// Decode a queue payload
    pub fn decode(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

fn string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        UInt(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
        Id::UInt(n) => n.to_string(),
    })
}
