//! Error types for the augmented search engine.

use thiserror::Error;

/// Result type alias for augmented search operations.
pub type Result<T> = std::result::Result<T, AugmentError>;

/// Errors that can occur in the augmented search engine.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// Embedding subsystem error.
    #[error("embedding error: {0}")]
    Embedding(#[from] ragcore_embeddings::EmbeddingError),

    /// No vector index attached to the engine.
    #[error("no vector index configured")]
    NotConfigured,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Document source error.
    #[error("source error: {0}")]
    Source(String),
}
