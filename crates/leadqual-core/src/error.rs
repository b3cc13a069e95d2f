//! Error types for leadqual

use thiserror::Error;

/// Result type alias using LeadQualError
pub type Result<T> = std::result::Result<T, LeadQualError>;

/// Error type alias for convenience
pub type Error = LeadQualError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const UNAVAILABLE: i32 = 4;
}

/// Main error type for leadqual
#[derive(Debug, Error)]
pub enum LeadQualError {
    /// The filter extraction response could not be parsed into a lead filter
    #[error("Malformed extraction: {0}")]
    MalformedExtraction(String),

    /// The vector store could not be queried
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// A completion call failed (transport, status or empty answer)
    #[error("Completion error: {0}")]
    Completion(String),

    /// Vector store backend fault outside of retrieval (ingest, delete)
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Deadline exceeded after {0}ms")]
    DeadlineExceeded(u64),

    #[error("Router error: {0}")]
    Router(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LeadQualError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) | Self::MalformedExtraction(_) => {
                exit_codes::INVALID_INPUT
            }
            Self::RetrievalUnavailable(_)
            | Self::Completion(_)
            | Self::Http(_)
            | Self::DeadlineExceeded(_) => exit_codes::UNAVAILABLE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether the error comes from a remote collaborator rather than the input
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::RetrievalUnavailable(_) | Self::Completion(_) | Self::Http(_) | Self::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            LeadQualError::MalformedExtraction("x".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            LeadQualError::RetrievalUnavailable("down".into()).exit_code(),
            exit_codes::UNAVAILABLE
        );
        assert_eq!(
            LeadQualError::Router("loop".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }

    #[test]
    fn test_upstream_classification() {
        assert!(LeadQualError::Completion("timeout".into()).is_upstream());
        assert!(!LeadQualError::InvalidInput("empty".into()).is_upstream());
    }
}
