//! Error types for ragpipe

use std::time::Duration;
use thiserror::Error;

/// Result type alias using RagError
pub type Result<T> = std::result::Result<T, RagError>;

/// Error type alias for convenience
pub type Error = RagError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_READY: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const UPSTREAM_FAILURE: i32 = 4;
}

/// Main error type for ragpipe
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    #[error("Vector index is not ready: build() has not completed")]
    IndexNotReady,

    #[error("Vector index was already built; create a new index to rebuild")]
    IndexAlreadyBuilt,

    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::IndexNotReady | Self::EmptyCorpus => exit_codes::NOT_READY,
            Self::InvalidInput(_) | Self::Config(_) | Self::DimensionMismatch { .. } => {
                exit_codes::INVALID_INPUT
            }
            Self::EmbeddingFailure(_) | Self::GenerationFailure(_) => exit_codes::UPSTREAM_FAILURE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether a retry of the same call may succeed.
    ///
    /// Only connection problems, timeouts and rate-limit/5xx responses are
    /// transient. Everything else (bad input, quota, auth) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::ServiceUnavailable(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Wrap a gateway error as an embedding failure, keeping fatal
    /// configuration errors as they are.
    pub fn into_embedding_failure(self) -> Self {
        match self {
            Self::EmbeddingFailure(_) | Self::DimensionMismatch { .. } | Self::Cancelled => self,
            other => Self::EmbeddingFailure(other.to_string()),
        }
    }

    /// Wrap a gateway error as a generation failure.
    pub fn into_generation_failure(self) -> Self {
        match self {
            Self::GenerationFailure(_) | Self::Cancelled => self,
            other => Self::GenerationFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RagError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(RagError::ServiceUnavailable("503".into()).is_transient());
        assert!(!RagError::ExternalError("400".into()).is_transient());
        assert!(!RagError::InvalidInput("bad".into()).is_transient());
    }

    #[test]
    fn test_failure_wrapping() {
        let err = RagError::ServiceUnavailable("503".into()).into_embedding_failure();
        assert!(matches!(err, RagError::EmbeddingFailure(_)));

        let err = RagError::DimensionMismatch {
            expected: 3,
            actual: 4,
        }
        .into_embedding_failure();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));

        let err = RagError::ExternalError("quota".into()).into_generation_failure();
        assert!(matches!(err, RagError::GenerationFailure(_)));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RagError::IndexNotReady.exit_code(), exit_codes::NOT_READY);
        assert_eq!(
            RagError::Config("x".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            RagError::GenerationFailure("x".into()).exit_code(),
            exit_codes::UPSTREAM_FAILURE
        );
    }
}
