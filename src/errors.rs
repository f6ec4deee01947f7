//! Error types for the school retrieval service
//!
//! Each component reports its own typed failure; the retrieval service wraps
//! embedder and index failures so callers can still inspect the original cause.

use thiserror::Error;

/// Failures raised by an embedder
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Text is empty or longer than the model accepts
    #[error("Invalid embedding input: {0}")]
    InvalidInput(String),

    /// Model files could not be fetched or loaded
    #[error("Embedding model failed to load: {0}")]
    ModelLoad(String),

    /// Tokenization or the forward pass failed
    #[error("Embedding inference failed: {0}")]
    Inference(String),
}

impl From<candle_core::Error> for EmbedError {
    fn from(err: candle_core::Error) -> Self {
        EmbedError::Inference(err.to_string())
    }
}

/// Failures raised by a vector index client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Vector dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index service unreachable or too slow to answer
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    #[error("Vector index error: {0}")]
    Backend(String),
}

/// Underlying cause of a failed retrieval
#[derive(Error, Debug)]
pub enum RetrievalCause {
    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Failures of the retrieval pipeline
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Empty query or non-positive top_k; nothing was embedded or searched
    #[error("Invalid query: {0}")]
    InvalidInput(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(#[source] RetrievalCause),
}

impl RetrievalError {
    /// True when the caller sent something the pipeline cannot serve,
    /// including text longer than the embedding model accepts
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            RetrievalError::InvalidInput(_)
                | RetrievalError::RetrievalFailed(RetrievalCause::Embedding(EmbedError::InvalidInput(_)))
        )
    }

    /// True when the index could not be reached; the caller may retry later
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RetrievalError::RetrievalFailed(RetrievalCause::Index(IndexError::Unavailable(_)))
        )
    }
}

impl From<EmbedError> for RetrievalError {
    fn from(err: EmbedError) -> Self {
        RetrievalError::RetrievalFailed(RetrievalCause::Embedding(err))
    }
}

impl From<IndexError> for RetrievalError {
    fn from(err: IndexError) -> Self {
        RetrievalError::RetrievalFailed(RetrievalCause::Index(err))
    }
}

/// Failures of the outbound messaging relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid message request: {0}")]
    InvalidInput(String),

    #[error("Messaging relay not configured: {0}")]
    NotConfigured(String),

    /// Provider answered with a non-success status
    #[error("Messaging provider returned {status}: {body}")]
    RelayFailed { status: u16, body: String },

    #[error("Messaging provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Account linking did not complete
    #[error("WhatsApp login failed: {0}")]
    Login(String),
}

/// Configuration load, validation and persistence errors
#[derive(Error, Debug)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_retrieval_failed_keeps_cause() {
        let err = RetrievalError::from(IndexError::Unavailable("connection refused".to_string()));
        assert!(err.is_unavailable());
        assert!(!err.is_invalid_input());

        let source = err.source().expect("cause attached");
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn test_embedder_input_error_counts_as_invalid_input() {
        let err = RetrievalError::from(EmbedError::InvalidInput("too long".to_string()));
        assert!(err.is_invalid_input());
        assert!(matches!(err, RetrievalError::RetrievalFailed(RetrievalCause::Embedding(_))));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = IndexError::DimensionMismatch { expected: 384, actual: 768 };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn test_relay_failed_display() {
        let err = RelayError::RelayFailed {
            status: 401,
            body: "{\"detail\":\"bad key\"}".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }
}
