//! Error types for testmend

use thiserror::Error;

/// Result type alias using the testmend Error
pub type Result<T> = std::result::Result<T, Error>;

/// testmend error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: &str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Infrastructure failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Database(_) | Error::StorageUnavailable(_)
        )
    }

    /// Stable tag for callers that need to branch on the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Database(_) => "database",
            Error::Serialization(_) => "serialization",
            Error::Validation(_) => "validation",
            Error::NotFound { .. } => "not_found",
            Error::Conflict(_) => "conflict",
            Error::InvalidStateTransition { .. } => "invalid_state_transition",
            Error::StorageUnavailable(_) => "storage_unavailable",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_storage_errors() {
        assert!(Error::StorageUnavailable("down".into()).is_transient());
        assert!(Error::Database(rusqlite::Error::InvalidQuery).is_transient());
        assert!(!Error::Validation("bad".into()).is_transient());
        assert!(!Error::Conflict("stale".into()).is_transient());
        assert!(!Error::not_found("record", "x").is_transient());
    }

    #[test]
    fn not_found_is_distinct_from_validation() {
        assert_eq!(Error::not_found("record", "abc").kind(), "not_found");
        assert_eq!(Error::Validation("limit".into()).kind(), "validation");
        assert_eq!(
            Error::not_found("pattern", "abc").to_string(),
            "Resource not found: pattern with id abc"
        );
    }
}
