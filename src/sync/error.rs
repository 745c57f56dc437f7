//! Error types for index synchronization

use crate::error::AppError;
use crate::messaging::MessagingError;
use crate::search::SearchError;

/// Result type for sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Errors raised while applying sync events
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Payload is not a valid sync event
    #[error("Malformed sync event: {0}")]
    Decode(String),

    /// Event names a business tag with no index
    #[error("Unknown business tag: {0}")]
    UnknownBiz(String),

    /// Event decoded but cannot be indexed
    #[error("Invalid sync event: {0}")]
    InvalidEvent(String),

    /// The store rejected the upsert
    #[error("Upsert into {index} failed: {source}")]
    Upsert {
        index: String,
        #[source]
        source: SearchError,
    },

    /// Queue failure
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// `start` called on a running consumer
    #[error("Sync consumer already running")]
    AlreadyRunning,
}

impl SyncError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Decode(_) => "decode",
            SyncError::UnknownBiz(_) => "unknown_biz",
            SyncError::InvalidEvent(_) => "invalid",
            SyncError::Upsert { .. } => "upsert",
            SyncError::Messaging(_) => "messaging",
            SyncError::AlreadyRunning => "already_running",
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Messaging(e) => e.into(),
            SyncError::Decode(_) | SyncError::UnknownBiz(_) | SyncError::InvalidEvent(_) => {
                AppError::Validation(err.to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}
