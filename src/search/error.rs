//! Error types for search operations

use crate::error::AppError;
use crate::search::biz::Biz;
use crate::search::expression::ParseError;

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Malformed `biz:<target>:<keywords>` expression
    #[error(transparent)]
    InvalidExpression(#[from] ParseError),

    /// Well-formed expression naming a target with no registered handler
    #[error("No handler for business: {0}")]
    UnknownTarget(String),

    /// A per-entity handler failed during fan-out
    #[error("Search for {biz} failed: {source}")]
    HandlerFailed {
        biz: Biz,
        #[source]
        source: Box<SearchError>,
    },

    /// The whole search exceeded its deadline
    #[error("Search timed out after {0}ms")]
    Timeout(u64),

    /// Requested page reaches past the result window
    #[error("Result window too large: offset {offset} + limit {limit} exceeds {window}")]
    ResultWindowExceeded {
        offset: usize,
        limit: usize,
        window: usize,
    },

    /// Index initialization failed
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// Index not found
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// A stored hit could not be decoded into an entity record
    #[error("Invalid document {id}: {message}")]
    InvalidDocument { id: String, message: String },

    /// Schema error
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SearchError {
    /// Wrap an error raised by the handler for `biz`.
    pub fn handler(biz: Biz, source: SearchError) -> Self {
        SearchError::HandlerFailed {
            biz,
            source: Box::new(source),
        }
    }

    /// Whether the error was caused by the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidExpression(_)
                | SearchError::UnknownTarget(_)
                | SearchError::ResultWindowExceeded { .. }
        )
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::InvalidExpression(_) => "parse",
            SearchError::UnknownTarget(_) => "unknown_target",
            SearchError::HandlerFailed { .. } => "handler",
            SearchError::Timeout(_) => "timeout",
            SearchError::ResultWindowExceeded { .. } => "window",
            _ => "store",
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidExpression(_)
            | SearchError::UnknownTarget(_)
            | SearchError::ResultWindowExceeded { .. } => AppError::Validation(err.to_string()),
            SearchError::Timeout(_) => AppError::Timeout(err.to_string()),
            SearchError::IndexNotFound(msg) => AppError::NotFound(msg),
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_keeps_biz() {
        let err = SearchError::handler(Biz::Skill, SearchError::SearchFailed("boom".into()));
        assert_eq!(err.to_string(), "Search for skill failed: Search execution failed: boom");
        assert_eq!(err.kind(), "handler");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_errors_map_to_validation() {
        let err = SearchError::UnknownTarget("roadmap".into());
        assert!(err.is_client_error());
        assert!(matches!(AppError::from(err), AppError::Validation(_)));

        let err = SearchError::ResultWindowExceeded {
            offset: 9_995,
            limit: 20,
            window: 10_000,
        };
        assert!(err.is_client_error());
        assert_eq!(err.kind(), "window");
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }
}
