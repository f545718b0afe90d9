//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Required credentials or model identifier missing at construction.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Provider returned no usable embeddings.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Vectors of differing length in one batch or comparison.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search invoked before the index was built.
    #[error("index not built")]
    NotBuilt,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
